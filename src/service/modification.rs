//! Correction workflow: users propose retroactive changes to their own
//! sessions; admins approve (session fields overwritten in place, duration
//! recomputed) or reject (session untouched).

use chrono::NaiveDateTime;
use tracing::info;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::model::{
    request::{ModificationRequest, RequestStatus},
    session::WorkLocation,
};
use crate::store::{
    NewAuditLog, NewModificationRequest, ReviewUpdate, SessionUpdate, Store, UnitOfWork,
};

const DEFAULT_REASON: &str = "No reason given";
const DEFAULT_REJECTION: &str = "Rejected without reason";

/// The fields a correction may touch. `None` means "leave as is".
#[derive(Debug, Clone, Default)]
pub struct RequestedChanges {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub work_location: Option<WorkLocation>,
}

pub struct ModificationService<S, C> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> ModificationService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Files a pending correction request against a session the caller owns.
    pub async fn request_modification(
        &self,
        user_id: u64,
        work_session_id: u64,
        changes: RequestedChanges,
        reason: Option<String>,
    ) -> Result<ModificationRequest, ServiceError> {
        let mut uow = self.store.begin().await?;

        let Some(record) = uow.session_by_id(work_session_id).await? else {
            return Err(ServiceError::NotFound("work session not found".into()));
        };
        if record.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "work session belongs to another user".into(),
            ));
        }

        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string());

        let request = uow
            .insert_modification(NewModificationRequest {
                user_id,
                work_session_id,
                requested_check_in: changes.check_in,
                requested_check_out: changes.check_out,
                requested_work_location: changes.work_location,
                reason,
            })
            .await?;

        uow.append_audit(NewAuditLog {
            user_id: Some(user_id),
            action: "request_modification".into(),
            entity_type: "modification_request".into(),
            entity_id: Some(request.id),
            description: Some(format!("correction requested for session {work_session_id}")),
            created_at: self.clock.now(),
        })
        .await?;

        uow.commit().await?;
        Ok(request)
    }

    /// Approves or rejects a pending request. Approval applies only the
    /// fields present in the request and recomputes the duration when the
    /// check-out changed; rejection leaves the session untouched.
    pub async fn review_modification(
        &self,
        request_id: u64,
        approve: bool,
        reviewer: &super::AuthContext,
        rejection_reason: Option<String>,
    ) -> Result<ModificationRequest, ServiceError> {
        reviewer.require_admin()?;

        let mut uow = self.store.begin().await?;

        let Some(mut request) = uow.modification_by_id(request_id).await? else {
            return Err(ServiceError::NotFound(
                "modification request not found".into(),
            ));
        };
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(
                "modification request already reviewed".into(),
            ));
        }

        let now = self.clock.now();

        if approve {
            let Some(record) = uow.session_by_id(request.work_session_id).await? else {
                return Err(ServiceError::NotFound(
                    "referenced work session no longer exists".into(),
                ));
            };

            let effective_check_in = request.requested_check_in.unwrap_or(record.check_in);
            let mut update = SessionUpdate {
                check_in: request.requested_check_in,
                check_out: request.requested_check_out,
                work_location: request.requested_work_location,
                ..Default::default()
            };
            if let Some(new_check_out) = request.requested_check_out {
                update.work_duration =
                    Some(super::duration_minutes(effective_check_in, new_check_out)?);
            }

            uow.update_session(record.id, &update).await?;
            request.status = RequestStatus::Approved;
        } else {
            request.status = RequestStatus::Rejected;
            request.rejection_reason =
                Some(rejection_reason.unwrap_or_else(|| DEFAULT_REJECTION.to_string()));
        }

        request.reviewed_by = Some(reviewer.user_id);
        request.reviewed_at = Some(now);

        uow.update_modification(
            request_id,
            &ReviewUpdate {
                status: request.status,
                reviewed_by: reviewer.user_id,
                reviewed_at: now,
                rejection_reason: request.rejection_reason.clone(),
            },
        )
        .await?;

        uow.append_audit(NewAuditLog {
            user_id: Some(reviewer.user_id),
            action: "review_modification".into(),
            entity_type: "modification_request".into(),
            entity_id: Some(request_id),
            description: Some(
                if approve {
                    "modification request approved"
                } else {
                    "modification request rejected"
                }
                .into(),
            ),
            created_at: now,
        })
        .await?;

        uow.commit().await?;
        info!(request_id, approve, reviewer = reviewer.user_id, "modification reviewed");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::role::Role;
    use crate::model::session::AttendanceRecord;
    use crate::service::AuthContext;
    use crate::store::memory::MemStore;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn closed_session(store: &MemStore, user_id: u64) -> AttendanceRecord {
        store.add_session(AttendanceRecord {
            id: 0,
            user_id,
            check_in: dt(1, 8, 0),
            check_out: Some(dt(1, 16, 0)),
            work_location: WorkLocation::Office,
            work_duration: Some(480),
            date: dt(1, 8, 0).date(),
            is_overtime_generated: false,
        })
    }

    fn admin() -> AuthContext {
        AuthContext {
            user_id: 50,
            role: Role::Admin,
        }
    }

    fn service(store: &MemStore) -> ModificationService<MemStore, FixedClock> {
        ModificationService::new(store.clone(), FixedClock(dt(2, 9, 0)))
    }

    #[actix_web::test]
    async fn request_against_missing_session_is_not_found() {
        let store = MemStore::new();
        let err = service(&store)
            .request_modification(1, 777, RequestedChanges::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[actix_web::test]
    async fn request_against_foreign_session_is_forbidden() {
        let store = MemStore::new();
        let session = closed_session(&store, 2); // owned by user 2

        let err = service(&store)
            .request_modification(1, session.id, RequestedChanges::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        // no request row was created
        assert!(store.modification(session.id + 1).is_none());
        assert!(store.audit_entries().is_empty());
    }

    #[actix_web::test]
    async fn empty_reason_gets_the_placeholder() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);

        let request = service(&store)
            .request_modification(1, session.id, RequestedChanges::default(), Some("  ".into()))
            .await
            .unwrap();
        assert_eq!(request.reason, DEFAULT_REASON);
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[actix_web::test]
    async fn approval_applies_only_requested_fields() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);
        let svc = service(&store);

        // Only the check-out moves; check-in and location must survive.
        let request = svc
            .request_modification(
                1,
                session.id,
                RequestedChanges {
                    check_out: Some(dt(1, 17, 30)),
                    ..Default::default()
                },
                Some("forgot to check out".into()),
            )
            .await
            .unwrap();

        let reviewed = svc
            .review_modification(request.id, true, &admin(), None)
            .await
            .unwrap();
        assert_eq!(reviewed.status, RequestStatus::Approved);
        assert_eq!(reviewed.reviewed_by, Some(50));

        let updated = store.session(session.id).unwrap();
        assert_eq!(updated.check_in, dt(1, 8, 0));
        assert_eq!(updated.work_location, WorkLocation::Office);
        assert_eq!(updated.check_out, Some(dt(1, 17, 30)));
        assert_eq!(updated.work_duration, Some(570));
    }

    #[actix_web::test]
    async fn approval_recomputes_duration_against_new_check_in() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);
        let svc = service(&store);

        let request = svc
            .request_modification(
                1,
                session.id,
                RequestedChanges {
                    check_in: Some(dt(1, 9, 0)),
                    check_out: Some(dt(1, 18, 0)),
                    work_location: Some(WorkLocation::HomeOffice),
                },
                None,
            )
            .await
            .unwrap();

        svc.review_modification(request.id, true, &admin(), None)
            .await
            .unwrap();

        let updated = store.session(session.id).unwrap();
        assert_eq!(updated.check_in, dt(1, 9, 0));
        assert_eq!(updated.work_duration, Some(540));
        assert_eq!(updated.work_location, WorkLocation::HomeOffice);
    }

    #[actix_web::test]
    async fn approval_of_inverted_interval_fails_validation() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);
        let svc = service(&store);

        let request = svc
            .request_modification(
                1,
                session.id,
                RequestedChanges {
                    check_out: Some(dt(1, 7, 0)), // before the 08:00 check-in
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let err = svc
            .review_modification(request.id, true, &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // rolled back: session and request both unchanged
        let record = store.session(session.id).unwrap();
        assert_eq!(record.check_out, Some(dt(1, 16, 0)));
        assert_eq!(
            store.modification(request.id).unwrap().status,
            RequestStatus::Pending
        );
    }

    #[actix_web::test]
    async fn rejection_stores_reason_and_leaves_session_alone() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);
        let svc = service(&store);

        let request = svc
            .request_modification(
                1,
                session.id,
                RequestedChanges {
                    check_out: Some(dt(1, 20, 0)),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let reviewed = svc
            .review_modification(request.id, false, &admin(), Some("insufficient evidence".into()))
            .await
            .unwrap();

        assert_eq!(reviewed.status, RequestStatus::Rejected);
        assert_eq!(
            reviewed.rejection_reason.as_deref(),
            Some("insufficient evidence")
        );

        let record = store.session(session.id).unwrap();
        assert_eq!(record.check_out, Some(dt(1, 16, 0)));
        assert_eq!(record.work_duration, Some(480));
    }

    #[actix_web::test]
    async fn reviewed_request_is_terminal() {
        let store = MemStore::new();
        let session = closed_session(&store, 1);
        let svc = service(&store);

        let request = svc
            .request_modification(1, session.id, RequestedChanges::default(), None)
            .await
            .unwrap();
        svc.review_modification(request.id, false, &admin(), None)
            .await
            .unwrap();

        let err = svc
            .review_modification(request.id, true, &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
