use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::service::report::ReportService;
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Defaults to the caller; other users require the admin role
    pub user_id: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn service(pool: &web::Data<MySqlPool>) -> ReportService<MySqlStore> {
    ReportService::new(MySqlStore::new(pool.get_ref().clone()))
}

/// Resolves the report subject; reading another user's data is admin-only.
fn subject(auth: &AuthUser, requested: Option<u64>) -> Result<u64, ServiceError> {
    match requested {
        Some(user_id) if user_id != auth.user_id => {
            auth.context().require_admin()?;
            Ok(user_id)
        }
        Some(user_id) => Ok(user_id),
        None => Ok(auth.user_id),
    }
}

/// Attendance summary for a user over a date range
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Attendance summary", body = crate::service::report::AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No records in range")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, ServiceError> {
    let user_id = subject(&auth, query.user_id)?;
    let summary = service(&pool)
        .summary(user_id, query.start_date, query.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Sessions that generated overtime for a user
#[utoipa::path(
    get,
    path = "/api/reports/overtime",
    params(ReportQuery),
    responses(
        (status = 200, description = "Overtime-generating sessions"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No overtime records in range")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn overtime_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, ServiceError> {
    let user_id = subject(&auth, query.user_id)?;
    let records = service(&pool)
        .user_overtime(user_id, query.start_date, query.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Company-wide office / home-office split (admin)
#[utoipa::path(
    get,
    path = "/api/reports/locations",
    responses(
        (status = 200, description = "Work location statistics", body = crate::service::report::LocationStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn location_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ServiceError> {
    auth.context().require_admin()?;
    let stats = service(&pool).location_stats().await?;

    Ok(HttpResponse::Ok().json(stats))
}
