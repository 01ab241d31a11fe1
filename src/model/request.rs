use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::session::WorkLocation;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Overtime review request. Either auto-generated at check-out when the
/// session ran past the configured threshold, or submitted directly.
/// Pending is the only mutable state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OvertimeRequest {
    pub id: u64,
    pub user_id: u64,
    pub work_session_id: Option<u64>,
    pub overtime_minutes: i64,
    #[schema(example = "2026-01-01T17:30:00", value_type = String, format = "date-time")]
    pub request_date: NaiveDateTime,
    pub status: RequestStatus,
    pub reviewed_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub is_auto_generated: bool,
}

/// User-submitted proposal to alter a past session's timestamps or location.
/// Fields left as None mean "no change".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ModificationRequest {
    pub id: u64,
    pub user_id: u64,
    pub work_session_id: u64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub requested_check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub requested_check_out: Option<NaiveDateTime>,
    pub requested_work_location: Option<WorkLocation>,
    pub reason: String,
    pub status: RequestStatus,
    pub reviewed_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
}
