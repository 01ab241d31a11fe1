use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::list::{FilterValue, Paginated, page_window};
use crate::auth::auth::AuthUser;
use crate::clock::SystemClock;
use crate::error::ServiceError;
use crate::model::request::ModificationRequest;
use crate::model::session::WorkLocation;
use crate::service::modification::{ModificationService, RequestedChanges};
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, ToSchema)]
pub struct CreateModification {
    pub work_session_id: u64,
    #[schema(value_type = Option<String>, format = "date-time", example = "2026-01-01T08:00:00")]
    pub requested_check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time", example = "2026-01-01T16:30:00")]
    pub requested_check_out: Option<NaiveDateTime>,
    pub requested_location: Option<WorkLocation>,
    #[schema(example = "forgot to check out")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectReq {
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ModificationFilter {
    /// Filter by request status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Filter by requesting user
    pub user_id: Option<u64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

fn service(pool: &web::Data<MySqlPool>) -> ModificationService<MySqlStore, SystemClock> {
    ModificationService::new(MySqlStore::new(pool.get_ref().clone()), SystemClock)
}

/// Submit a correction request for an own session
#[utoipa::path(
    post,
    path = "/api/modifications",
    request_body = CreateModification,
    responses(
        (status = 200, description = "Modification request submitted", body = ModificationRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Modification"
)]
pub async fn create_modification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateModification>,
) -> Result<impl Responder, ServiceError> {
    let payload = payload.into_inner();
    let request = service(&pool)
        .request_modification(
            auth.user_id,
            payload.work_session_id,
            RequestedChanges {
                check_in: payload.requested_check_in,
                check_out: payload.requested_check_out,
                work_location: payload.requested_location,
            },
            payload.reason,
        )
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Approve a modification request (admin)
#[utoipa::path(
    put,
    path = "/api/modifications/{request_id}/approve",
    params(("request_id" = u64, Path, description = "Modification request ID")),
    responses(
        (status = 200, description = "Request approved", body = ModificationRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Modification"
)]
pub async fn approve_modification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ServiceError> {
    let request = service(&pool)
        .review_modification(path.into_inner(), true, &auth.context(), None)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Reject a modification request (admin)
#[utoipa::path(
    put,
    path = "/api/modifications/{request_id}/reject",
    params(("request_id" = u64, Path, description = "Modification request ID")),
    request_body = RejectReq,
    responses(
        (status = 200, description = "Request rejected", body = ModificationRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Modification"
)]
pub async fn reject_modification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectReq>,
) -> Result<impl Responder, ServiceError> {
    let request = service(&pool)
        .review_modification(
            path.into_inner(),
            false,
            &auth.context(),
            payload.into_inner().rejection_reason,
        )
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// List modification requests with filters (admin)
#[utoipa::path(
    get,
    path = "/api/modifications",
    params(ModificationFilter),
    responses(
        (status = 200, description = "Paginated modification request list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Modification"
)]
pub async fn list_modifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ModificationFilter>,
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

    let count_sql = format!("SELECT COUNT(*) FROM modification_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count modification requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, user_id, work_session_id, requested_check_in, requested_check_out, \
                requested_work_location, reason, status, reviewed_by, reviewed_at, \
                rejection_reason \
         FROM modification_requests{where_sql} \
         ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, ModificationRequest>(&data_sql);
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
            tracing::error!(error = %e, "Failed to fetch modification requests");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: requests,
        page,
        per_page,
        total,
    }))
}
