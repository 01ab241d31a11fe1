use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::list::{FilterValue, Paginated, page_window};
use crate::auth::auth::AuthUser;
use crate::model::session::AttendanceRecord;
use crate::model::user::User;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserFilter {
    /// Filter by role (user or admin)
    pub role: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SessionFilter {
    /// Filter by session owner
    pub user_id: Option<u64>,
    /// Sessions on or after this date
    pub start_date: Option<NaiveDate>,
    /// Sessions on or before this date
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// List registered users (admin)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserFilter),
    responses(
        (status = 200, description = "Paginated user list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(role) = query.role.as_deref() {
        where_sql.push_str(" AND role = ?");
        args.push(FilterValue::Str(role.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM users{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, username, email, password_hash, role, is_active, created_at \
         FROM users{where_sql} ORDER BY id LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, User>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }
    let users = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: users,
        page,
        per_page,
        total,
    }))
}

/// List work sessions across users (admin)
#[utoipa::path(
    get,
    path = "/api/admin/sessions",
    params(SessionFilter),
    responses(
        (status = 200, description = "Paginated work session list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_sessions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SessionFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(start) = query.start_date {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Str(start.to_string()));
    }
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Str(end.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM work_sessions{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count work sessions");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, user_id, check_in, check_out, work_location, work_duration, \
                date, is_overtime_generated \
         FROM work_sessions{where_sql} ORDER BY check_in DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }
    let sessions = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch work sessions");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: sessions,
        page,
        per_page,
        total,
    }))
}
