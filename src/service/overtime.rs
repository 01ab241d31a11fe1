//! Overtime detection and the overtime review workflow. Reviewing only flips
//! the request's own status; the underlying session is never touched here.

use chrono::NaiveDateTime;
use tracing::info;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::model::{
    request::{OvertimeRequest, RequestStatus},
    session::AttendanceRecord,
};
use crate::store::{NewAuditLog, NewOvertimeRequest, ReviewUpdate, Store, UnitOfWork};

const DEFAULT_REJECTION: &str = "Rejected without reason";

/// Minutes past the threshold, if any. Exactly at the threshold counts as a
/// regular day.
pub fn excess_minutes(duration: i64, threshold: i64) -> Option<i64> {
    (duration > threshold).then(|| duration - threshold)
}

/// Creates the pending auto-generated request for a session that ran past
/// the threshold. Runs inside the caller's unit of work so a failure fails
/// the whole check-out.
pub async fn auto_generate<U: UnitOfWork>(
    uow: &mut U,
    record: &AttendanceRecord,
    excess: i64,
    now: NaiveDateTime,
) -> Result<OvertimeRequest, ServiceError> {
    let request = uow
        .insert_overtime(NewOvertimeRequest {
            user_id: record.user_id,
            work_session_id: Some(record.id),
            overtime_minutes: excess,
            request_date: now,
            is_auto_generated: true,
        })
        .await?;
    Ok(request)
}

pub struct OvertimeService<S, C> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> OvertimeService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Direct submission path for self-reported overtime.
    pub async fn submit(
        &self,
        user_id: u64,
        work_session_id: Option<u64>,
        overtime_minutes: i64,
    ) -> Result<OvertimeRequest, ServiceError> {
        if overtime_minutes <= 0 {
            return Err(ServiceError::Validation(
                "overtime_minutes must be positive".into(),
            ));
        }

        let mut uow = self.store.begin().await?;

        if let Some(session_id) = work_session_id {
            let Some(record) = uow.session_by_id(session_id).await? else {
                return Err(ServiceError::NotFound("work session not found".into()));
            };
            if record.user_id != user_id {
                return Err(ServiceError::Forbidden(
                    "work session belongs to another user".into(),
                ));
            }
        }

        let now = self.clock.now();
        let request = uow
            .insert_overtime(NewOvertimeRequest {
                user_id,
                work_session_id,
                overtime_minutes,
                request_date: now,
                is_auto_generated: false,
            })
            .await?;

        uow.append_audit(NewAuditLog {
            user_id: Some(user_id),
            action: "submit_overtime".into(),
            entity_type: "overtime_request".into(),
            entity_id: Some(request.id),
            description: Some(format!("{overtime_minutes} overtime minutes submitted")),
            created_at: now,
        })
        .await?;

        uow.commit().await?;
        Ok(request)
    }

    /// Approves or rejects a pending request. Terminal requests cannot be
    /// re-reviewed.
    pub async fn review(
        &self,
        request_id: u64,
        approve: bool,
        reviewer: &super::AuthContext,
        rejection_reason: Option<String>,
    ) -> Result<OvertimeRequest, ServiceError> {
        reviewer.require_admin()?;

        let mut uow = self.store.begin().await?;

        let Some(mut request) = uow.overtime_by_id(request_id).await? else {
            return Err(ServiceError::NotFound("overtime request not found".into()));
        };
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(
                "overtime request already reviewed".into(),
            ));
        }

        let now = self.clock.now();
        request.status = if approve {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        request.reviewed_by = Some(reviewer.user_id);
        request.reviewed_at = Some(now);
        if !approve {
            request.rejection_reason =
                Some(rejection_reason.unwrap_or_else(|| DEFAULT_REJECTION.to_string()));
        }

        uow.update_overtime(
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
            action: "review_overtime".into(),
            entity_type: "overtime_request".into(),
            entity_id: Some(request_id),
            description: Some(
                if approve {
                    "overtime request approved"
                } else {
                    "overtime request rejected"
                }
                .into(),
            ),
            created_at: now,
        })
        .await?;

        uow.commit().await?;
        info!(request_id, approve, reviewer = reviewer.user_id, "overtime reviewed");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::role::Role;
    use crate::service::AuthContext;
    use crate::store::memory::MemStore;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn admin() -> AuthContext {
        AuthContext {
            user_id: 99,
            role: Role::Admin,
        }
    }

    fn pending_request(store: &MemStore, user_id: u64) -> OvertimeRequest {
        store.add_overtime(OvertimeRequest {
            id: 0,
            user_id,
            work_session_id: None,
            overtime_minutes: 45,
            request_date: now(),
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            is_auto_generated: true,
        })
    }

    #[test]
    fn excess_is_strictly_above_threshold() {
        assert_eq!(excess_minutes(541, 540), Some(1));
        assert_eq!(excess_minutes(540, 540), None);
        assert_eq!(excess_minutes(570, 540), Some(30));
    }

    #[actix_web::test]
    async fn approve_stamps_reviewer_metadata_only() {
        let store = MemStore::new();
        let request = pending_request(&store, 1);
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let reviewed = svc.review(request.id, true, &admin(), None).await.unwrap();

        assert_eq!(reviewed.status, RequestStatus::Approved);
        assert_eq!(reviewed.reviewed_by, Some(99));
        assert_eq!(reviewed.reviewed_at, Some(now()));
        assert!(reviewed.rejection_reason.is_none());
    }

    #[actix_web::test]
    async fn reject_stores_a_reason() {
        let store = MemStore::new();
        let request = pending_request(&store, 1);
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let reviewed = svc
            .review(request.id, false, &admin(), Some("not plausible".into()))
            .await
            .unwrap();

        assert_eq!(reviewed.status, RequestStatus::Rejected);
        assert_eq!(reviewed.rejection_reason.as_deref(), Some("not plausible"));
    }

    #[actix_web::test]
    async fn re_review_conflicts() {
        let store = MemStore::new();
        let request = pending_request(&store, 1);
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        svc.review(request.id, false, &admin(), None).await.unwrap();
        let err = svc.review(request.id, true, &admin(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[actix_web::test]
    async fn review_requires_admin_role() {
        let store = MemStore::new();
        let request = pending_request(&store, 1);
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let user = AuthContext {
            user_id: 1,
            role: Role::User,
        };
        let err = svc.review(request.id, true, &user, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn review_of_missing_request_is_not_found() {
        let store = MemStore::new();
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let err = svc.review(4242, true, &admin(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[actix_web::test]
    async fn submit_rejects_non_positive_minutes() {
        let store = MemStore::new();
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let err = svc.submit(1, None, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.overtime_requests().is_empty());
    }

    #[actix_web::test]
    async fn submit_against_foreign_session_is_forbidden() {
        use crate::model::session::{AttendanceRecord, WorkLocation};

        let store = MemStore::new();
        let session = store.add_session(AttendanceRecord {
            id: 0,
            user_id: 2,
            check_in: now(),
            check_out: Some(now()),
            work_location: WorkLocation::Office,
            work_duration: Some(0),
            date: now().date(),
            is_overtime_generated: false,
        });
        let svc = OvertimeService::new(store.clone(), FixedClock(now()));

        let err = svc.submit(1, Some(session.id), 30).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
