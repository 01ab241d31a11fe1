//! Record store abstraction. The services never touch the database driver
//! directly: each mutating operation runs against one [`UnitOfWork`] and
//! commits (or rolls back, by dropping) as a whole, audit entry included.
//!
//! Two implementations: [`mysql::MySqlStore`] over an sqlx transaction, and
//! [`memory::MemStore`] for the service tests.

pub mod memory;
pub mod mysql;

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::{
    request::{ModificationRequest, OvertimeRequest, RequestStatus},
    session::{AttendanceRecord, WorkLocation},
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique or check constraint rejected the write.
    #[error("{0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// New-row payload for a session created at check-in.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: u64,
    pub check_in: NaiveDateTime,
    pub work_location: WorkLocation,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewOvertimeRequest {
    pub user_id: u64,
    pub work_session_id: Option<u64>,
    pub overtime_minutes: i64,
    pub request_date: NaiveDateTime,
    pub is_auto_generated: bool,
}

#[derive(Debug, Clone)]
pub struct NewModificationRequest {
    pub user_id: u64,
    pub work_session_id: u64,
    pub requested_check_in: Option<NaiveDateTime>,
    pub requested_check_out: Option<NaiveDateTime>,
    pub requested_work_location: Option<WorkLocation>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<u64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<u64>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Explicit per-entity update: only the fields a session may legitimately
/// change, `None` meaning "leave as is".
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub work_location: Option<WorkLocation>,
    pub work_duration: Option<i64>,
    pub is_overtime_generated: Option<bool>,
}

/// Review outcome applied to an overtime or modification request.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub status: RequestStatus,
    pub reviewed_by: u64,
    pub reviewed_at: NaiveDateTime,
    pub rejection_reason: Option<String>,
}

/// One request-scoped transaction. Reads taken through a unit of work are
/// serialized against concurrent writers; dropping without `commit` rolls
/// every staged write back.
#[allow(async_fn_in_trait)]
pub trait UnitOfWork {
    async fn find_open_session(&mut self, user_id: u64)
    -> Result<Option<AttendanceRecord>, StoreError>;

    async fn session_by_id(&mut self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn insert_session(&mut self, new: NewSession) -> Result<AttendanceRecord, StoreError>;

    async fn update_session(&mut self, id: u64, update: &SessionUpdate)
    -> Result<(), StoreError>;

    async fn insert_overtime(
        &mut self,
        new: NewOvertimeRequest,
    ) -> Result<OvertimeRequest, StoreError>;

    async fn overtime_by_id(&mut self, id: u64) -> Result<Option<OvertimeRequest>, StoreError>;

    async fn update_overtime(&mut self, id: u64, review: &ReviewUpdate)
    -> Result<(), StoreError>;

    async fn insert_modification(
        &mut self,
        new: NewModificationRequest,
    ) -> Result<ModificationRequest, StoreError>;

    async fn modification_by_id(
        &mut self,
        id: u64,
    ) -> Result<Option<ModificationRequest>, StoreError>;

    async fn update_modification(
        &mut self,
        id: u64,
        review: &ReviewUpdate,
    ) -> Result<(), StoreError>;

    async fn append_audit(&mut self, entry: NewAuditLog) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

/// Handle to the record store. `begin` opens a unit of work; the remaining
/// methods are plain committed-state reads used by the aggregation views.
#[allow(async_fn_in_trait)]
pub trait Store {
    type Uow: UnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, StoreError>;

    async fn open_session(&self, user_id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Sessions for a user within `[from, to]` inclusive, ordered by date
    /// then check-in.
    async fn sessions_between(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Status of the overtime request attached to each of the given
    /// sessions, where one exists.
    async fn overtime_status_by_session(
        &self,
        session_ids: &[u64],
    ) -> Result<HashMap<u64, RequestStatus>, StoreError>;

    /// (total, office, home_office) closed-or-open session counts.
    async fn location_counts(&self) -> Result<(i64, i64, i64), StoreError>;
}
