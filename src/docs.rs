use crate::api::attendance::{CheckInReq, WeeklyQuery};
use crate::api::modification::{CreateModification, ModificationFilter, RejectReq};
use crate::api::overtime::{CreateOvertime, OvertimeFilter};
use crate::api::report::ReportQuery;
use crate::model::request::{ModificationRequest, OvertimeRequest, RequestStatus};
use crate::model::role::Role;
use crate::model::session::{AttendanceRecord, WorkLocation};
use crate::model::user::User;
use crate::models::{LoginReq, RegisterReq};
use crate::service::report::{AttendanceSummary, LocationStats};
use crate::service::weekly::{DayAttendance, SessionSummary, WeeklyAttendance};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worktime API",
        version = "1.0.0",
        description = r#"
## Workplace Attendance & Overtime Tracking

This API tracks daily work sessions and the overtime they generate.

### 🔹 Key Features
- **Attendance**
  - Check in / check out with work location, weekly Monday-Sunday view
- **Overtime**
  - Automatic detection above the configured daily threshold, self-reported
    requests, admin approval workflow
- **Modifications**
  - Request corrections to recorded sessions, reviewed by admins
- **Reports**
  - Per-user attendance totals, overtime days, office vs. home-office split

### 🔐 Security
All `/api` endpoints require **JWT Bearer authentication**. Review and
listing endpoints additionally require the **admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::weekly,

        crate::api::modification::create_modification,
        crate::api::modification::approve_modification,
        crate::api::modification::reject_modification,
        crate::api::modification::list_modifications,

        crate::api::overtime::create_overtime,
        crate::api::overtime::approve_overtime,
        crate::api::overtime::reject_overtime,
        crate::api::overtime::list_overtime,

        crate::api::admin::list_users,
        crate::api::admin::list_sessions,

        crate::api::report::attendance_summary,
        crate::api::report::overtime_report,
        crate::api::report::location_stats
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            User,
            Role,
            AttendanceRecord,
            WorkLocation,
            CheckInReq,
            WeeklyQuery,
            WeeklyAttendance,
            DayAttendance,
            SessionSummary,
            OvertimeRequest,
            ModificationRequest,
            RequestStatus,
            CreateOvertime,
            OvertimeFilter,
            CreateModification,
            ModificationFilter,
            RejectReq,
            ReportQuery,
            AttendanceSummary,
            LocationStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login APIs"),
        (name = "Attendance", description = "Work session lifecycle APIs"),
        (name = "Overtime", description = "Overtime request APIs"),
        (name = "Modification", description = "Session correction APIs"),
        (name = "Admin", description = "Administrative listing APIs"),
        (name = "Reports", description = "Attendance reporting APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
