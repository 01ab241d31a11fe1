use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::list::{FilterValue, Paginated, page_window};
use crate::auth::auth::AuthUser;
use crate::clock::SystemClock;
use crate::error::ServiceError;
use crate::model::request::OvertimeRequest;
use crate::service::overtime::OvertimeService;
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    pub work_session_id: Option<u64>,
    #[schema(example = 45)]
    pub overtime_minutes: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectReq {
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OvertimeFilter {
    /// Filter by request status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Filter by requesting user
    pub user_id: Option<u64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

fn service(pool: &web::Data<MySqlPool>) -> OvertimeService<MySqlStore, SystemClock> {
    OvertimeService::new(MySqlStore::new(pool.get_ref().clone()), SystemClock)
}

/// Submit self-reported overtime
#[utoipa::path(
    post,
    path = "/api/overtime",
    request_body = CreateOvertime,
    responses(
        (status = 200, description = "Overtime request submitted", body = OvertimeRequest),
        (status = 400, description = "Non-positive minutes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn create_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOvertime>,
) -> Result<impl Responder, ServiceError> {
    let request = service(&pool)
        .submit(auth.user_id, payload.work_session_id, payload.overtime_minutes)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Approve an overtime request (admin)
#[utoipa::path(
    put,
    path = "/api/overtime/{request_id}/approve",
    params(("request_id" = u64, Path, description = "Overtime request ID")),
    responses(
        (status = 200, description = "Request approved", body = OvertimeRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn approve_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ServiceError> {
    let request = service(&pool)
        .review(path.into_inner(), true, &auth.context(), None)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Reject an overtime request (admin)
#[utoipa::path(
    put,
    path = "/api/overtime/{request_id}/reject",
    params(("request_id" = u64, Path, description = "Overtime request ID")),
    request_body = RejectReq,
    responses(
        (status = 200, description = "Request rejected", body = OvertimeRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn reject_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectReq>,
) -> Result<impl Responder, ServiceError> {
    let request = service(&pool)
        .review(
            path.into_inner(),
            false,
            &auth.context(),
            payload.into_inner().rejection_reason,
        )
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// List overtime requests with filters (admin)
#[utoipa::path(
    get,
    path = "/api/overtime",
    params(OvertimeFilter),
    responses(
        (status = 200, description = "Paginated overtime request list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn list_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<OvertimeFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM overtime_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count overtime requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, user_id, work_session_id, overtime_minutes, request_date, status, \
                reviewed_by, reviewed_at, rejection_reason, is_auto_generated \
         FROM overtime_requests{where_sql} \
         ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, OvertimeRequest>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }
    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch overtime requests");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: requests,
        page,
        per_page,
        total,
    }))
}
