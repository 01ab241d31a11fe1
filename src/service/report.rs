//! Read-only attendance reports: per-user totals, overtime days and the
//! office / home-office split.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::session::{AttendanceRecord, WorkLocation};
use crate::store::Store;

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub total_records: usize,
    pub total_hours: f64,
    pub home_office_days: usize,
    pub office_days: usize,
    #[schema(example = "42.9%")]
    pub home_office_ratio: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationStats {
    pub total_days: i64,
    pub office_days: i64,
    pub home_office_days: i64,
    #[schema(example = "42.9%")]
    pub home_office_ratio: String,
}

fn ratio(part: i64, whole: i64) -> String {
    if whole == 0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", part as f64 / whole as f64 * 100.0)
    }
}

pub struct ReportService<S> {
    store: S,
}

impl<S: Store> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn sessions(
        &self,
        user_id: u64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, ServiceError> {
        // MySQL DATE bounds, used when no range is given.
        let from = from.unwrap_or_else(|| NaiveDate::from_ymd_opt(1000, 1, 1).unwrap());
        let to = to.unwrap_or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
        Ok(self.store.sessions_between(user_id, from, to).await?)
    }

    pub async fn summary(
        &self,
        user_id: u64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AttendanceSummary, ServiceError> {
        let records = self.sessions(user_id, from, to).await?;
        if records.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "no attendance records for user {user_id}"
            )));
        }

        let total_minutes: i64 = records.iter().filter_map(|r| r.work_duration).sum();
        let home = records
            .iter()
            .filter(|r| r.work_location == WorkLocation::HomeOffice)
            .count();
        let office = records
            .iter()
            .filter(|r| r.work_location == WorkLocation::Office)
            .count();

        Ok(AttendanceSummary {
            total_records: records.len(),
            total_hours: (total_minutes as f64 / 60.0 * 100.0).round() / 100.0,
            home_office_days: home,
            office_days: office,
            home_office_ratio: ratio(home as i64, records.len() as i64),
        })
    }

    /// Sessions of a user that generated an overtime request.
    pub async fn user_overtime(
        &self,
        user_id: u64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, ServiceError> {
        let mut records = self.sessions(user_id, from, to).await?;
        records.retain(|r| r.is_overtime_generated);
        if records.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "no overtime records for user {user_id}"
            )));
        }
        Ok(records)
    }

    pub async fn location_stats(&self) -> Result<LocationStats, ServiceError> {
        let (total, office, home) = self.store.location_counts().await?;
        Ok(LocationStats {
            total_days: total,
            office_days: office,
            home_office_days: home,
            home_office_ratio: ratio(home, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemStore;
    use chrono::NaiveDateTime;

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn add(store: &MemStore, user_id: u64, day: u32, minutes: i64, loc: WorkLocation, overtime: bool) {
        store.add_session(AttendanceRecord {
            id: 0,
            user_id,
            check_in: dt(day, 8),
            check_out: Some(dt(day, 8) + chrono::Duration::minutes(minutes)),
            work_location: loc,
            work_duration: Some(minutes),
            date: dt(day, 8).date(),
            is_overtime_generated: overtime,
        });
    }

    #[actix_web::test]
    async fn summary_totals_and_ratio() {
        let store = MemStore::new();
        add(&store, 1, 1, 480, WorkLocation::Office, false);
        add(&store, 1, 2, 510, WorkLocation::HomeOffice, false);
        add(&store, 1, 3, 570, WorkLocation::Office, true);
        add(&store, 2, 3, 480, WorkLocation::HomeOffice, false);

        let report = ReportService::new(store.clone());
        let summary = report.summary(1, None, None).await.unwrap();

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.total_hours, 26.0);
        assert_eq!(summary.office_days, 2);
        assert_eq!(summary.home_office_days, 1);
        assert_eq!(summary.home_office_ratio, "33.3%");
    }

    #[actix_web::test]
    async fn summary_respects_the_date_range() {
        let store = MemStore::new();
        add(&store, 1, 1, 480, WorkLocation::Office, false);
        add(&store, 1, 10, 480, WorkLocation::Office, false);

        let report = ReportService::new(store.clone());
        let summary = report
            .summary(
                1,
                Some(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()),
                Some(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(summary.total_records, 1);
    }

    #[actix_web::test]
    async fn empty_summary_is_not_found() {
        let store = MemStore::new();
        let report = ReportService::new(store.clone());
        let err = report.summary(1, None, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[actix_web::test]
    async fn user_overtime_filters_flagged_sessions() {
        let store = MemStore::new();
        add(&store, 1, 1, 480, WorkLocation::Office, false);
        add(&store, 1, 2, 600, WorkLocation::Office, true);

        let report = ReportService::new(store.clone());
        let records = report.user_overtime(1, None, None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].work_duration, Some(600));
    }

    #[actix_web::test]
    async fn location_stats_cover_all_users() {
        let store = MemStore::new();
        add(&store, 1, 1, 480, WorkLocation::Office, false);
        add(&store, 2, 1, 480, WorkLocation::HomeOffice, false);
        add(&store, 3, 1, 480, WorkLocation::Other, false);

        let report = ReportService::new(store.clone());
        let stats = report.location_stats().await.unwrap();
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.office_days, 1);
        assert_eq!(stats.home_office_days, 1);
        assert_eq!(stats.home_office_ratio, "33.3%");
    }
}
