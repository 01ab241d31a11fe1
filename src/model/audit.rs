use chrono::NaiveDateTime;
use serde::Serialize;

/// Append-only action log entry. The core only ever writes these; reading
/// them back is an operational concern, not service logic.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: u64,
    pub user_id: Option<u64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<u64>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}
