use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::ServiceError;
use crate::model::session::WorkLocation;
use crate::service::attendance::AttendanceService;
use crate::service::weekly::WeeklyService;
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    /// Defaults to office.
    #[schema(example = "home_office")]
    pub location: Option<WorkLocation>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WeeklyQuery {
    /// Any day of the target week; snaps backward to its Monday.
    #[param(example = "2026-01-07")]
    pub week_start: Option<NaiveDate>,
}

fn lifecycle(
    pool: &web::Data<MySqlPool>,
    config: &web::Data<Config>,
) -> AttendanceService<MySqlStore, SystemClock> {
    AttendanceService::new(
        MySqlStore::new(pool.get_ref().clone()),
        SystemClock,
        config.overtime_threshold_min,
    )
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked in successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "An active work session already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CheckInReq>,
) -> Result<impl Responder, ServiceError> {
    let location = payload.location.unwrap_or(WorkLocation::Office);
    let record = lifecycle(&pool, &config).check_in(auth.user_id, location).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "checked_in",
        "session": record
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked out successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No active work session"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CheckInReq>,
) -> Result<impl Responder, ServiceError> {
    let location = payload.location.unwrap_or(WorkLocation::Office);
    let record = lifecycle(&pool, &config).check_out(auth.user_id, location).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "checked_out",
        "session": record
    })))
}

/// Weekly attendance view (Monday-Sunday, always 7 day entries)
#[utoipa::path(
    get,
    path = "/api/attendance/weekly",
    params(WeeklyQuery),
    responses(
        (status = 200, description = "Weekly view", body = crate::service::weekly::WeeklyAttendance),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn weekly(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WeeklyQuery>,
) -> Result<impl Responder, ServiceError> {
    let service = WeeklyService::new(MySqlStore::new(pool.get_ref().clone()), SystemClock);
    let view = service
        .weekly_attendance(auth.user_id, query.week_start)
        .await?;

    Ok(HttpResponse::Ok().json(view))
}
