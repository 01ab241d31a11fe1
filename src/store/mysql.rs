//! MySQL-backed record store. Each unit of work wraps one sqlx transaction;
//! REPEATABLE READ plus the explicit `FOR UPDATE` locks below give the
//! serializable read-then-write guard the check-in invariant needs.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::model::{
    request::{ModificationRequest, OvertimeRequest, RequestStatus},
    session::AttendanceRecord,
};
use crate::store::{
    NewAuditLog, NewModificationRequest, NewOvertimeRequest, NewSession, ReviewUpdate,
    SessionUpdate, Store, StoreError, UnitOfWork,
};

const SESSION_COLUMNS: &str = "id, user_id, check_in, check_out, work_location, work_duration, \
                               date, is_overtime_generated";
const OVERTIME_COLUMNS: &str = "id, user_id, work_session_id, overtime_minutes, request_date, \
                                status, reviewed_by, reviewed_at, rejection_reason, \
                                is_auto_generated";
const MODIFICATION_COLUMNS: &str = "id, user_id, work_session_id, requested_check_in, \
                                    requested_check_out, requested_work_location, reason, \
                                    status, reviewed_by, reviewed_at, rejection_reason";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub struct MySqlUow {
    tx: Transaction<'static, MySql>,
}

/// Duplicate-key and check violations come back as SQLSTATE 23000.
fn map_write_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Constraint(db_err.message().to_string());
        }
    }
    StoreError::Database(e)
}

impl UnitOfWork for MySqlUow {
    async fn find_open_session(
        &mut self,
        user_id: u64,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        // Lock the user row first so two concurrent check-ins serialize even
        // when neither yet sees an open session.
        sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions \
             WHERE user_id = ? AND check_out IS NULL FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn session_by_id(&mut self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn insert_session(&mut self, new: NewSession) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_sessions (user_id, check_in, work_location, date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.check_in)
        .bind(new.work_location)
        .bind(new.date)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            user_id: new.user_id,
            check_in: new.check_in,
            check_out: None,
            work_location: new.work_location,
            work_duration: None,
            date: new.date,
            is_overtime_generated: false,
        })
    }

    async fn update_session(
        &mut self,
        id: u64,
        update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        // Explicit field-by-field SET; only the columns a session may
        // legitimately change can ever appear here.
        let mut sets: Vec<&str> = Vec::new();
        if update.check_in.is_some() {
            sets.push("check_in = ?");
        }
        if update.check_out.is_some() {
            sets.push("check_out = ?");
        }
        if update.work_location.is_some() {
            sets.push("work_location = ?");
        }
        if update.work_duration.is_some() {
            sets.push("work_duration = ?");
        }
        if update.is_overtime_generated.is_some() {
            sets.push("is_overtime_generated = ?");
        }
        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!("UPDATE work_sessions SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(v) = update.check_in {
            query = query.bind(v);
        }
        if let Some(v) = update.check_out {
            query = query.bind(v);
        }
        if let Some(v) = update.work_location {
            query = query.bind(v);
        }
        if let Some(v) = update.work_duration {
            query = query.bind(v);
        }
        if let Some(v) = update.is_overtime_generated {
            query = query.bind(v);
        }

        query
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn insert_overtime(
        &mut self,
        new: NewOvertimeRequest,
    ) -> Result<OvertimeRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO overtime_requests
                (user_id, work_session_id, overtime_minutes, request_date, status,
                 is_auto_generated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.work_session_id)
        .bind(new.overtime_minutes)
        .bind(new.request_date)
        .bind(RequestStatus::Pending)
        .bind(new.is_auto_generated)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;

        Ok(OvertimeRequest {
            id: result.last_insert_id(),
            user_id: new.user_id,
            work_session_id: new.work_session_id,
            overtime_minutes: new.overtime_minutes,
            request_date: new.request_date,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            is_auto_generated: new.is_auto_generated,
        })
    }

    async fn overtime_by_id(&mut self, id: u64) -> Result<Option<OvertimeRequest>, StoreError> {
        let request = sqlx::query_as::<_, OvertimeRequest>(&format!(
            "SELECT {OVERTIME_COLUMNS} FROM overtime_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(request)
    }

    async fn update_overtime(&mut self, id: u64, review: &ReviewUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE overtime_requests
            SET status = ?, reviewed_by = ?, reviewed_at = ?, rejection_reason = ?
            WHERE id = ?
            "#,
        )
        .bind(review.status)
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .bind(review.rejection_reason.as_deref())
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn insert_modification(
        &mut self,
        new: NewModificationRequest,
    ) -> Result<ModificationRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO modification_requests
                (user_id, work_session_id, requested_check_in, requested_check_out,
                 requested_work_location, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.work_session_id)
        .bind(new.requested_check_in)
        .bind(new.requested_check_out)
        .bind(new.requested_work_location)
        .bind(&new.reason)
        .bind(RequestStatus::Pending)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;

        Ok(ModificationRequest {
            id: result.last_insert_id(),
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
        })
    }

    async fn modification_by_id(
        &mut self,
        id: u64,
    ) -> Result<Option<ModificationRequest>, StoreError> {
        let request = sqlx::query_as::<_, ModificationRequest>(&format!(
            "SELECT {MODIFICATION_COLUMNS} FROM modification_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(request)
    }

    async fn update_modification(
        &mut self,
        id: u64,
        review: &ReviewUpdate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE modification_requests
            SET status = ?, reviewed_by = ?, reviewed_at = ?, rejection_reason = ?
            WHERE id = ?
            "#,
        )
        .bind(review.status)
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .bind(review.rejection_reason.as_deref())
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn append_audit(&mut self, entry: NewAuditLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, description,
                                    created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.description.as_deref())
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl Store for MySqlStore {
    type Uow = MySqlUow;

    async fn begin(&self) -> Result<Self::Uow, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(MySqlUow { tx })
    }

    async fn open_session(&self, user_id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions \
             WHERE user_id = ? AND check_out IS NULL"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn sessions_between(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions \
             WHERE user_id = ? AND date BETWEEN ? AND ? \
             ORDER BY date, check_in"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn overtime_status_by_session(
        &self,
        session_ids: &[u64],
    ) -> Result<HashMap<u64, RequestStatus>, StoreError> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; session_ids.len()].join(", ");
        let sql = format!(
            "SELECT work_session_id, status FROM overtime_requests \
             WHERE work_session_id IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, (u64, RequestStatus)>(&sql);
        for id in session_ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    async fn location_counts(&self) -> Result<(i64, i64, i64), StoreError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_sessions")
                .fetch_one(&self.pool)
                .await?;
        let office = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_sessions WHERE work_location = 'office'",
        )
        .fetch_one(&self.pool)
        .await?;
        let home = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_sessions WHERE work_location = 'home_office'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((total, office, home))
    }
}
