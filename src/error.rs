//! Unified error type for the attendance services.
//! Every service method raises one of these synchronously; the API layer
//! maps each kind to a transport-level response code.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// State-machine violation: double check-in, check-out with no open
    /// session, re-review of a terminal request.
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Ownership or role violation.
    #[error("{0}")]
    Forbidden(String),

    /// Underlying transaction failure; any partial writes were rolled back.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // Unique/constraint violations are state conflicts, not outages.
            StoreError::Constraint(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Storage(e) = self {
            tracing::error!(error = %e, "service storage failure");
            // Do not leak storage details to the client.
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error",
                "status": 500
            }));
        }

        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violations_surface_as_conflict() {
        let err: ServiceError = StoreError::Constraint("open session exists".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ServiceError::Validation(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
