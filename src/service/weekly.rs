//! Weekly aggregation view: a read-only Monday-Sunday breakdown of one
//! user's sessions. Never mutates and never audits.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::model::{request::RequestStatus, session::AttendanceRecord};
use crate::store::Store;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    /// Clock time "HH:MM" for display.
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    /// Stored duration for closed sessions, live `now - check_in` for the
    /// open one.
    pub duration_minutes: Option<i64>,
    pub is_active: bool,
    pub overtime_status: Option<RequestStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DayAttendance {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeeklyAttendance {
    #[schema(value_type = String, format = "date")]
    pub week_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub week_end: NaiveDate,
    /// Always exactly seven entries, keyed Monday through Sunday.
    pub weekly_data: BTreeMap<String, DayAttendance>,
    pub active_session: Option<SessionSummary>,
}

/// Monday of the week containing `anchor`.
pub fn week_monday(anchor: NaiveDate) -> NaiveDate {
    anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64)
}

fn summarize(
    record: &AttendanceRecord,
    now: NaiveDateTime,
    overtime_status: Option<RequestStatus>,
) -> SessionSummary {
    let is_active = record.check_out.is_none();
    let duration_minutes = if is_active {
        // Live duration; clamp clock skew to zero rather than fail a read.
        Some((now - record.check_in).num_seconds().max(0) / 60)
    } else {
        record.work_duration
    };

    SessionSummary {
        id: record.id,
        check_in: record.check_in,
        check_out: record.check_out,
        check_in_time: record.check_in.format("%H:%M").to_string(),
        check_out_time: record.check_out.map(|t| t.format("%H:%M").to_string()),
        duration_minutes,
        is_active,
        overtime_status,
    }
}

pub struct WeeklyService<S, C> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> WeeklyService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Aggregates the Monday-Sunday week containing `week_start` (today if
    /// omitted); any weekday snaps backward to that week's Monday.
    pub async fn weekly_attendance(
        &self,
        user_id: u64,
        week_start: Option<NaiveDate>,
    ) -> Result<WeeklyAttendance, ServiceError> {
        let now = self.clock.now();
        let monday = week_monday(week_start.unwrap_or_else(|| now.date()));
        let sunday = monday + Duration::days(6);

        let sessions = self.store.sessions_between(user_id, monday, sunday).await?;
        let session_ids: Vec<u64> = sessions.iter().map(|s| s.id).collect();
        let overtime = self.store.overtime_status_by_session(&session_ids).await?;

        let mut weekly_data = BTreeMap::new();
        for (offset, name) in WEEKDAYS.iter().enumerate() {
            let date = monday + Duration::days(offset as i64);
            let day_sessions = sessions
                .iter()
                .filter(|s| s.date == date)
                .map(|s| summarize(s, now, overtime.get(&s.id).copied()))
                .collect();
            weekly_data.insert(
                name.to_string(),
                DayAttendance {
                    date,
                    sessions: day_sessions,
                },
            );
        }

        let active_session = self
            .store
            .open_session(user_id)
            .await?
            .filter(|s| s.date >= monday && s.date <= sunday)
            .map(|s| summarize(&s, now, overtime.get(&s.id).copied()));

        Ok(WeeklyAttendance {
            week_start: monday,
            week_end: sunday,
            weekly_data,
            active_session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::request::OvertimeRequest;
    use crate::model::session::WorkLocation;
    use crate::store::memory::MemStore;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn closed(store: &MemStore, user_id: u64, day: u32, from: (u32, u32), to: (u32, u32)) -> AttendanceRecord {
        let check_in = dt(day, from.0, from.1);
        let check_out = dt(day, to.0, to.1);
        store.add_session(AttendanceRecord {
            id: 0,
            user_id,
            check_in,
            check_out: Some(check_out),
            work_location: WorkLocation::Office,
            work_duration: Some((check_out - check_in).num_minutes()),
            date: check_in.date(),
            is_overtime_generated: false,
        })
    }

    fn service(store: &MemStore, now: NaiveDateTime) -> WeeklyService<MemStore, FixedClock> {
        WeeklyService::new(store.clone(), FixedClock(now))
    }

    #[test]
    fn any_weekday_snaps_to_the_same_monday() {
        // 2024-01-01 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(week_monday(monday), monday);
        assert_eq!(week_monday(wednesday), monday);
        assert_eq!(week_monday(sunday), monday);
    }

    #[actix_web::test]
    async fn always_returns_seven_day_entries() {
        let store = MemStore::new();
        let view = service(&store, dt(3, 12, 0))
            .weekly_attendance(1, None)
            .await
            .unwrap();

        assert_eq!(view.weekly_data.len(), 7);
        for name in WEEKDAYS {
            let day = &view.weekly_data[name];
            assert!(day.sessions.is_empty());
        }
        assert_eq!(view.week_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(view.week_end, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert!(view.active_session.is_none());
    }

    #[actix_web::test]
    async fn sessions_land_on_their_days_in_order() {
        let store = MemStore::new();
        closed(&store, 1, 2, (13, 0), (17, 0)); // Tuesday afternoon
        closed(&store, 1, 2, (8, 0), (12, 0)); // Tuesday morning
        closed(&store, 1, 4, (9, 0), (17, 0)); // Thursday
        closed(&store, 2, 3, (9, 0), (17, 0)); // another user, ignored

        let view = service(&store, dt(5, 12, 0))
            .weekly_attendance(1, None)
            .await
            .unwrap();

        let tuesday = &view.weekly_data["Tuesday"];
        assert_eq!(tuesday.sessions.len(), 2);
        assert_eq!(tuesday.sessions[0].check_in_time, "08:00");
        assert_eq!(tuesday.sessions[1].check_in_time, "13:00");
        assert_eq!(view.weekly_data["Thursday"].sessions.len(), 1);
        assert_eq!(view.weekly_data["Wednesday"].sessions.len(), 0);
    }

    #[actix_web::test]
    async fn open_session_gets_live_duration_and_active_block() {
        let store = MemStore::new();
        store.add_session(AttendanceRecord {
            id: 0,
            user_id: 1,
            check_in: dt(3, 8, 0),
            check_out: None,
            work_location: WorkLocation::HomeOffice,
            work_duration: None,
            date: dt(3, 8, 0).date(),
            is_overtime_generated: false,
        });

        let view = service(&store, dt(3, 10, 30))
            .weekly_attendance(1, None)
            .await
            .unwrap();

        let active = view.active_session.expect("active session block");
        assert!(active.is_active);
        assert_eq!(active.duration_minutes, Some(150));
        assert!(active.check_out.is_none());

        let wednesday = &view.weekly_data["Wednesday"];
        assert_eq!(wednesday.sessions.len(), 1);
        assert!(wednesday.sessions[0].is_active);
        assert_eq!(wednesday.sessions[0].duration_minutes, Some(150));
    }

    #[actix_web::test]
    async fn open_session_outside_the_week_is_not_active_here() {
        let store = MemStore::new();
        store.add_session(AttendanceRecord {
            id: 0,
            user_id: 1,
            check_in: dt(10, 8, 0), // following week
            check_out: None,
            work_location: WorkLocation::Office,
            work_duration: None,
            date: dt(10, 8, 0).date(),
            is_overtime_generated: false,
        });

        let view = service(&store, dt(10, 9, 0))
            .weekly_attendance(1, Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()))
            .await
            .unwrap();

        assert!(view.active_session.is_none());
        assert!(view.weekly_data.values().all(|d| d.sessions.is_empty()));
    }

    #[actix_web::test]
    async fn overtime_status_is_attached_to_its_session() {
        let store = MemStore::new();
        let session = closed(&store, 1, 2, (8, 0), (18, 0));
        store.add_overtime(OvertimeRequest {
            id: 0,
            user_id: 1,
            work_session_id: Some(session.id),
            overtime_minutes: 60,
            request_date: dt(2, 18, 0),
            status: RequestStatus::Approved,
            reviewed_by: Some(9),
            reviewed_at: Some(dt(3, 9, 0)),
            rejection_reason: None,
            is_auto_generated: true,
        });

        let view = service(&store, dt(5, 12, 0))
            .weekly_attendance(1, None)
            .await
            .unwrap();

        let tuesday = &view.weekly_data["Tuesday"];
        assert_eq!(
            tuesday.sessions[0].overtime_status,
            Some(RequestStatus::Approved)
        );
    }
}
