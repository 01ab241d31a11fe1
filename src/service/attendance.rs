//! Session lifecycle: check-in, check-out and the derived overtime
//! detection. At most one open session may exist per user at any time.

use tracing::info;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::model::session::{AttendanceRecord, WorkLocation};
use crate::service::overtime;
use crate::store::{NewAuditLog, NewSession, SessionUpdate, Store, UnitOfWork};

pub struct AttendanceService<S, C> {
    store: S,
    clock: C,
    /// Minutes a closed session may run before the excess is flagged.
    overtime_threshold: i64,
}

impl<S: Store, C: Clock> AttendanceService<S, C> {
    pub fn new(store: S, clock: C, overtime_threshold: i64) -> Self {
        Self {
            store,
            clock,
            overtime_threshold,
        }
    }

    /// Opens a new session for the user. Fails with Conflict while another
    /// session is still open.
    pub async fn check_in(
        &self,
        user_id: u64,
        location: WorkLocation,
    ) -> Result<AttendanceRecord, ServiceError> {
        let mut uow = self.store.begin().await?;

        if uow.find_open_session(user_id).await?.is_some() {
            return Err(ServiceError::Conflict(
                "an active work session already exists".into(),
            ));
        }

        let now = self.clock.now();
        let record = uow
            .insert_session(NewSession {
                user_id,
                check_in: now,
                work_location: location,
                date: now.date(),
            })
            .await?;

        uow.append_audit(NewAuditLog {
            user_id: Some(user_id),
            action: "check_in".into(),
            entity_type: "work_session".into(),
            entity_id: Some(record.id),
            description: Some(format!("checked in from {location}")),
            created_at: now,
        })
        .await?;

        uow.commit().await?;
        info!(user_id, session_id = record.id, "user checked in");
        Ok(record)
    }

    /// Closes the user's open session, overwriting the location with the
    /// value given at check-out and computing the duration. A session that
    /// ran past the threshold auto-creates a pending overtime request in the
    /// same transaction.
    pub async fn check_out(
        &self,
        user_id: u64,
        location: WorkLocation,
    ) -> Result<AttendanceRecord, ServiceError> {
        let mut uow = self.store.begin().await?;

        let Some(mut record) = uow.find_open_session(user_id).await? else {
            return Err(ServiceError::Conflict("no active work session".into()));
        };

        let now = self.clock.now();
        let duration = super::duration_minutes(record.check_in, now)?;

        record.check_out = Some(now);
        record.work_location = location;
        record.work_duration = Some(duration);

        let mut update = SessionUpdate {
            check_out: Some(now),
            work_location: Some(location),
            work_duration: Some(duration),
            ..Default::default()
        };

        if let Some(excess) = overtime::excess_minutes(duration, self.overtime_threshold) {
            overtime::auto_generate(&mut uow, &record, excess, now).await?;
            record.is_overtime_generated = true;
            update.is_overtime_generated = Some(true);
        }

        uow.update_session(record.id, &update).await?;

        uow.append_audit(NewAuditLog {
            user_id: Some(user_id),
            action: "check_out".into(),
            entity_type: "work_session".into(),
            entity_id: Some(record.id),
            description: Some(format!("checked out after {duration} minutes")),
            created_at: now,
        })
        .await?;

        uow.commit().await?;
        info!(user_id, session_id = record.id, duration, "user checked out");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::request::RequestStatus;
    use crate::store::memory::MemStore;
    use chrono::{NaiveDate, NaiveDateTime};

    const THRESHOLD: i64 = 540;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn service(store: &MemStore, now: NaiveDateTime) -> AttendanceService<MemStore, FixedClock> {
        AttendanceService::new(store.clone(), FixedClock(now), THRESHOLD)
    }

    #[actix_web::test]
    async fn check_in_creates_an_open_session() {
        let store = MemStore::new();
        let svc = service(&store, at(1, 8, 0));

        let record = svc.check_in(1, WorkLocation::Office).await.unwrap();

        assert!(record.is_open());
        assert_eq!(record.date, at(1, 8, 0).date());
        let stored = store.session(record.id).unwrap();
        assert_eq!(stored.check_in, at(1, 8, 0));
        assert_eq!(store.audit_entries().len(), 1);
        assert_eq!(store.audit_entries()[0].action, "check_in");
    }

    #[actix_web::test]
    async fn second_check_in_conflicts() {
        let store = MemStore::new();
        let svc = service(&store, at(1, 8, 0));
        svc.check_in(1, WorkLocation::Office).await.unwrap();

        let err = svc.check_in(1, WorkLocation::HomeOffice).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.session_count(), 1);
    }

    #[actix_web::test]
    async fn racing_check_ins_cannot_both_commit() {
        // Two units of work that both observed "no open session" before
        // either committed; the store constraint must fail the loser.
        let store = MemStore::new();
        let clock = FixedClock(at(1, 8, 0));

        let mut uow_a = store.begin().await.unwrap();
        let mut uow_b = store.begin().await.unwrap();
        assert!(uow_a.find_open_session(1).await.unwrap().is_none());
        assert!(uow_b.find_open_session(1).await.unwrap().is_none());

        let new = |_: ()| NewSession {
            user_id: 1,
            check_in: clock.0,
            work_location: WorkLocation::Office,
            date: clock.0.date(),
        };
        uow_a.insert_session(new(())).await.unwrap();
        uow_b.insert_session(new(())).await.unwrap();

        assert!(uow_a.commit().await.is_ok());
        let err = uow_b.commit().await.unwrap_err();
        assert!(matches!(err, crate::store::StoreError::Constraint(_)));
        assert_eq!(store.session_count(), 1);
    }

    #[actix_web::test]
    async fn check_out_without_open_session_conflicts() {
        let store = MemStore::new();
        let svc = service(&store, at(1, 17, 0));

        let err = svc.check_out(1, WorkLocation::Office).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.session_count(), 0);
        assert!(store.audit_entries().is_empty());
    }

    #[actix_web::test]
    async fn check_out_closes_and_computes_duration() {
        let store = MemStore::new();
        service(&store, at(1, 8, 0))
            .check_in(1, WorkLocation::Office)
            .await
            .unwrap();

        // 570 minutes later, from home this time
        let record = service(&store, at(1, 17, 30))
            .check_out(1, WorkLocation::HomeOffice)
            .await
            .unwrap();

        assert_eq!(record.work_duration, Some(570));
        assert_eq!(record.work_location, WorkLocation::HomeOffice);
        assert!(record.is_overtime_generated);

        let requests = store.overtime_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].overtime_minutes, 30);
        assert_eq!(requests[0].status, RequestStatus::Pending);
        assert!(requests[0].is_auto_generated);
        assert_eq!(requests[0].work_session_id, Some(record.id));
    }

    #[actix_web::test]
    async fn duration_at_threshold_creates_no_overtime() {
        let store = MemStore::new();
        service(&store, at(1, 8, 0))
            .check_in(1, WorkLocation::Office)
            .await
            .unwrap();

        let record = service(&store, at(1, 17, 0))
            .check_out(1, WorkLocation::Office)
            .await
            .unwrap();

        assert_eq!(record.work_duration, Some(540));
        assert!(!record.is_overtime_generated);
        assert!(store.overtime_requests().is_empty());
    }

    #[actix_web::test]
    async fn one_minute_over_threshold_flags_one_minute() {
        let store = MemStore::new();
        service(&store, at(1, 8, 0))
            .check_in(1, WorkLocation::Office)
            .await
            .unwrap();

        service(&store, at(1, 17, 1))
            .check_out(1, WorkLocation::Office)
            .await
            .unwrap();

        let requests = store.overtime_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].overtime_minutes, 1);
    }

    #[actix_web::test]
    async fn check_out_before_check_in_is_rejected() {
        let store = MemStore::new();
        service(&store, at(2, 8, 0))
            .check_in(1, WorkLocation::Office)
            .await
            .unwrap();

        // Clock skew: "now" is before the recorded check-in.
        let err = service(&store, at(1, 8, 0))
            .check_out(1, WorkLocation::Office)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // Session stays open, nothing was written.
        let open = store.open_session(1).await.unwrap();
        assert!(open.is_some());
        assert_eq!(store.audit_entries().len(), 1); // only the check-in entry
    }
}
