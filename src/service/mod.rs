//! Core attendance services. Each method is one atomic unit of work against
//! the record store, with one audit entry per mutating operation.

pub mod attendance;
pub mod modification;
pub mod overtime;
pub mod report;
pub mod weekly;

use chrono::NaiveDateTime;

use crate::error::ServiceError;
use crate::model::role::Role;

/// Resolved caller identity, handed in by the API boundary. Review
/// operations re-check the role here instead of trusting ambient claims.
#[derive(Debug, Copy, Clone)]
pub struct AuthContext {
    pub user_id: u64,
    pub role: Role,
}

impl AuthContext {
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("admin role required".into()))
        }
    }
}

/// Whole minutes between check-in and check-out, truncated. A check-out
/// before check-in is a data-integrity failure, never a negative duration.
pub(crate) fn duration_minutes(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
) -> Result<i64, ServiceError> {
    let delta = check_out.signed_duration_since(check_in);
    if delta < chrono::Duration::zero() {
        return Err(ServiceError::Validation(
            "check-out precedes check-in".into(),
        ));
    }
    Ok(delta.num_seconds() / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn duration_truncates_to_whole_minutes() {
        assert_eq!(duration_minutes(dt(8, 0, 0), dt(17, 30, 0)).unwrap(), 570);
        // 59 leftover seconds do not round up
        assert_eq!(duration_minutes(dt(8, 0, 0), dt(8, 1, 59)).unwrap(), 1);
        assert_eq!(duration_minutes(dt(8, 0, 0), dt(8, 0, 0)).unwrap(), 0);
    }

    #[test]
    fn inverted_interval_is_a_validation_error() {
        let err = duration_minutes(dt(9, 0, 0), dt(8, 0, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn non_admin_context_is_forbidden() {
        let ctx = AuthContext {
            user_id: 7,
            role: Role::User,
        };
        assert!(matches!(
            ctx.require_admin(),
            Err(ServiceError::Forbidden(_))
        ));
        let admin = AuthContext {
            user_id: 1,
            role: Role::Admin,
        };
        assert!(admin.require_admin().is_ok());
    }
}
