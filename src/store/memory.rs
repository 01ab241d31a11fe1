//! In-memory record store used by the service tests. Writes are staged on
//! the unit of work and applied under one lock at commit, where the
//! one-open-session-per-user constraint is re-checked the way the MySQL
//! schema guard would.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use chrono::NaiveDate;

use crate::model::{
    audit::AuditLog,
    request::{ModificationRequest, OvertimeRequest, RequestStatus},
    session::AttendanceRecord,
};
use crate::store::{
    NewAuditLog, NewModificationRequest, NewOvertimeRequest, NewSession, ReviewUpdate,
    SessionUpdate, Store, StoreError, UnitOfWork,
};

#[derive(Default)]
struct State {
    sessions: Vec<AttendanceRecord>,
    overtime: Vec<OvertimeRequest>,
    modifications: Vec<ModificationRequest>,
    audit: Vec<AuditLog>,
}

#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
}

enum Op {
    InsertSession(AttendanceRecord),
    UpdateSession(u64, SessionUpdate),
    InsertOvertime(OvertimeRequest),
    UpdateOvertime(u64, ReviewUpdate),
    InsertModification(ModificationRequest),
    UpdateModification(u64, ReviewUpdate),
    Audit(NewAuditLog),
}

pub struct MemUow {
    state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
    ops: Vec<Op>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(next_id: &AtomicU64) -> u64 {
        next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Seeding and inspection helpers for tests.

    pub fn add_session(&self, mut record: AttendanceRecord) -> AttendanceRecord {
        record.id = Self::assign_id(&self.next_id);
        let mut state = self.state.lock().expect("store lock poisoned");
        state.sessions.push(record.clone());
        record
    }

    pub fn add_overtime(&self, mut request: OvertimeRequest) -> OvertimeRequest {
        request.id = Self::assign_id(&self.next_id);
        let mut state = self.state.lock().expect("store lock poisoned");
        state.overtime.push(request.clone());
        request
    }

    pub fn add_modification(&self, mut request: ModificationRequest) -> ModificationRequest {
        request.id = Self::assign_id(&self.next_id);
        let mut state = self.state.lock().expect("store lock poisoned");
        state.modifications.push(request.clone());
        request
    }

    pub fn session(&self, id: u64) -> Option<AttendanceRecord> {
        let state = self.state.lock().expect("store lock poisoned");
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    pub fn overtime_requests(&self) -> Vec<OvertimeRequest> {
        let state = self.state.lock().expect("store lock poisoned");
        state.overtime.clone()
    }

    pub fn modification(&self, id: u64) -> Option<ModificationRequest> {
        let state = self.state.lock().expect("store lock poisoned");
        state.modifications.iter().find(|m| m.id == id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditLog> {
        let state = self.state.lock().expect("store lock poisoned");
        state.audit.clone()
    }

    pub fn session_count(&self) -> usize {
        let state = self.state.lock().expect("store lock poisoned");
        state.sessions.len()
    }
}

fn apply_session_update(record: &mut AttendanceRecord, update: &SessionUpdate) {
    if let Some(v) = update.check_in {
        record.check_in = v;
    }
    if let Some(v) = update.check_out {
        record.check_out = Some(v);
    }
    if let Some(v) = update.work_location {
        record.work_location = v;
    }
    if let Some(v) = update.work_duration {
        record.work_duration = Some(v);
    }
    if let Some(v) = update.is_overtime_generated {
        record.is_overtime_generated = v;
    }
}

fn apply_review(
    status: &mut RequestStatus,
    reviewed_by: &mut Option<u64>,
    reviewed_at: &mut Option<chrono::NaiveDateTime>,
    rejection_reason: &mut Option<String>,
    review: &ReviewUpdate,
) {
    *status = review.status;
    *reviewed_by = Some(review.reviewed_by);
    *reviewed_at = Some(review.reviewed_at);
    if review.rejection_reason.is_some() {
        *rejection_reason = review.rejection_reason.clone();
    }
}

impl UnitOfWork for MemUow {
    async fn find_open_session(
        &mut self,
        user_id: u64,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.check_out.is_none())
            .cloned())
    }

    async fn session_by_id(&mut self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_session(&mut self, new: NewSession) -> Result<AttendanceRecord, StoreError> {
        let record = AttendanceRecord {
            id: MemStore::assign_id(&self.next_id),
            user_id: new.user_id,
            check_in: new.check_in,
            check_out: None,
            work_location: new.work_location,
            work_duration: None,
            date: new.date,
            is_overtime_generated: false,
        };
        self.ops.push(Op::InsertSession(record.clone()));
        Ok(record)
    }

    async fn update_session(
        &mut self,
        id: u64,
        update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        self.ops.push(Op::UpdateSession(id, update.clone()));
        Ok(())
    }

    async fn insert_overtime(
        &mut self,
        new: NewOvertimeRequest,
    ) -> Result<OvertimeRequest, StoreError> {
        let request = OvertimeRequest {
            id: MemStore::assign_id(&self.next_id),
            user_id: new.user_id,
            work_session_id: new.work_session_id,
            overtime_minutes: new.overtime_minutes,
            request_date: new.request_date,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            is_auto_generated: new.is_auto_generated,
        };
        self.ops.push(Op::InsertOvertime(request.clone()));
        Ok(request)
    }

    async fn overtime_by_id(&mut self, id: u64) -> Result<Option<OvertimeRequest>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state.overtime.iter().find(|r| r.id == id).cloned())
    }

    async fn update_overtime(&mut self, id: u64, review: &ReviewUpdate) -> Result<(), StoreError> {
        self.ops.push(Op::UpdateOvertime(id, review.clone()));
        Ok(())
    }

    async fn insert_modification(
        &mut self,
        new: NewModificationRequest,
    ) -> Result<ModificationRequest, StoreError> {
        let request = ModificationRequest {
            id: MemStore::assign_id(&self.next_id),
            user_id: new.user_id,
            work_session_id: new.work_session_id,
            requested_check_in: new.requested_check_in,
            requested_check_out: new.requested_check_out,
            requested_work_location: new.requested_work_location,
            reason: new.reason,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        };
        self.ops.push(Op::InsertModification(request.clone()));
        Ok(request)
    }

    async fn modification_by_id(
        &mut self,
        id: u64,
    ) -> Result<Option<ModificationRequest>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state.modifications.iter().find(|m| m.id == id).cloned())
    }

    async fn update_modification(
        &mut self,
        id: u64,
        review: &ReviewUpdate,
    ) -> Result<(), StoreError> {
        self.ops.push(Op::UpdateModification(id, review.clone()));
        Ok(())
    }

    async fn append_audit(&mut self, entry: NewAuditLog) -> Result<(), StoreError> {
        self.ops.push(Op::Audit(entry));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store lock poisoned");

        // Constraint check against the committed state: at most one open
        // session per user, exactly what the relational schema enforces.
        for op in &self.ops {
            if let Op::InsertSession(record) = op {
                let already_open = state
                    .sessions
                    .iter()
                    .any(|s| s.user_id == record.user_id && s.check_out.is_none());
                if already_open {
                    return Err(StoreError::Constraint(format!(
                        "user {} already has an open session",
                        record.user_id
                    )));
                }
            }
        }

        let mut next_audit_id = state.audit.len() as u64;
        for op in self.ops {
            match op {
                Op::InsertSession(record) => state.sessions.push(record),
                Op::UpdateSession(id, update) => {
                    if let Some(record) = state.sessions.iter_mut().find(|s| s.id == id) {
                        apply_session_update(record, &update);
                    }
                }
                Op::InsertOvertime(request) => state.overtime.push(request),
                Op::UpdateOvertime(id, review) => {
                    if let Some(req) = state.overtime.iter_mut().find(|r| r.id == id) {
                        apply_review(
                            &mut req.status,
                            &mut req.reviewed_by,
                            &mut req.reviewed_at,
                            &mut req.rejection_reason,
                            &review,
                        );
                    }
                }
                Op::InsertModification(request) => state.modifications.push(request),
                Op::UpdateModification(id, review) => {
                    if let Some(req) = state.modifications.iter_mut().find(|m| m.id == id) {
                        apply_review(
                            &mut req.status,
                            &mut req.reviewed_by,
                            &mut req.reviewed_at,
                            &mut req.rejection_reason,
                            &review,
                        );
                    }
                }
                Op::Audit(entry) => {
                    next_audit_id += 1;
                    state.audit.push(AuditLog {
                        id: next_audit_id,
                        user_id: entry.user_id,
                        action: entry.action,
                        entity_type: entry.entity_type,
                        entity_id: entry.entity_id,
                        description: entry.description,
                        created_at: entry.created_at,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Store for MemStore {
    type Uow = MemUow;

    async fn begin(&self) -> Result<Self::Uow, StoreError> {
        Ok(MemUow {
            state: Arc::clone(&self.state),
            next_id: Arc::clone(&self.next_id),
            ops: Vec::new(),
        })
    }

    async fn open_session(&self, user_id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.check_out.is_none())
            .cloned())
    }

    async fn sessions_between(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        let mut records: Vec<AttendanceRecord> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.date >= from && s.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|s| (s.date, s.check_in));
        Ok(records)
    }

    async fn overtime_status_by_session(
        &self,
        session_ids: &[u64],
    ) -> Result<HashMap<u64, RequestStatus>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");
        Ok(state
            .overtime
            .iter()
            .filter_map(|r| {
                r.work_session_id
                    .filter(|id| session_ids.contains(id))
                    .map(|id| (id, r.status))
            })
            .collect())
    }

    async fn location_counts(&self) -> Result<(i64, i64, i64), StoreError> {
        use crate::model::session::WorkLocation;

        let state = self.state.lock().expect("store lock poisoned");
        let total = state.sessions.len() as i64;
        let office = state
            .sessions
            .iter()
            .filter(|s| s.work_location == WorkLocation::Office)
            .count() as i64;
        let home = state
            .sessions
            .iter()
            .filter(|s| s.work_location == WorkLocation::HomeOffice)
            .count() as i64;
        Ok((total, office, home))
    }
}
