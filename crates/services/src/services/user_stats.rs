//! Dashboard bookkeeping derived from the user and stats files.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use db::json_store::{JsonStore, SystemStats, UserRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const TREND_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UserTrend {
    pub date: String,
    pub new_users: u32,
    pub logins: u32,
}

fn utc_date(iso: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Daily first-seen and last-login counts for the 30 days ending `today`.
/// Empty when there are no users.
pub fn user_trends(users: &[UserRecord], today: NaiveDate) -> Vec<UserTrend> {
    if users.is_empty() {
        return Vec::new();
    }
    let first = today - Duration::days(TREND_DAYS - 1);
    let mut trends: Vec<UserTrend> = (0..TREND_DAYS)
        .map(|offset| UserTrend {
            date: (first + Duration::days(offset)).format("%Y-%m-%d").to_string(),
            new_users: 0,
            logins: 0,
        })
        .collect();

    let slot = |date: Option<NaiveDate>| {
        date.filter(|d| *d >= first && *d <= today)
            .map(|d| (d - first).num_days() as usize)
    };
    for user in users {
        if let Some(i) = slot(utc_date(&user.first_seen)) {
            trends[i].new_users += 1;
        }
        if let Some(i) = slot(utc_date(&user.last_login)) {
            trends[i].logins += 1;
        }
    }
    trends
}

/// Snapshot of the file-backed counters shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub system_stats: SystemStats,
    pub user_count: usize,
    pub user_trends: Vec<UserTrend>,
}

#[derive(Clone)]
pub struct UserStatsService {
    store: JsonStore,
}

impl UserStatsService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// `totalUniqueUsers` is reported as the current number of user records.
    pub async fn summary(&self, today: NaiveDate) -> UserSummary {
        let users = self.store.load_users().await.users;
        let mut system_stats = self.store.load_stats().await;
        system_stats.total_unique_users = users.len() as u64;
        UserSummary {
            user_trends: user_trends(&users, today),
            user_count: users.len(),
            system_stats,
        }
    }

    pub async fn record_generation(&self) -> Result<u64, db::json_store::StoreError> {
        self.store.record_generated_note().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first_seen: &str, last_login: &str) -> UserRecord {
        UserRecord {
            ip: "1.2.3.4".into(),
            invite_codes: vec!["SOULNOTE2023".into()],
            first_seen: first_seen.into(),
            last_login: last_login.into(),
            login_count: 1,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    #[test]
    fn empty_without_users() {
        assert!(user_trends(&[], today()).is_empty());
    }

    #[test]
    fn thirty_days_ending_today() {
        let users = [
            user("2025-03-31T08:00:00.000Z", "2025-03-31T09:00:00.000Z"),
            user("2025-03-02T08:00:00.000Z", "2025-03-30T09:00:00.000Z"),
            user("2025-01-01T08:00:00.000Z", "2025-03-02T09:00:00.000Z"),
            user("garbage", "garbage"),
        ];
        let trends = user_trends(&users, today());
        assert_eq!(trends.len(), 30);
        assert_eq!(trends[0].date, "2025-03-02");
        assert_eq!(trends[29].date, "2025-03-31");
        assert_eq!(trends[29].new_users, 1);
        assert_eq!(trends[29].logins, 1);
        assert_eq!(trends[28].logins, 1);
        assert_eq!(trends[0].new_users, 1);
        assert_eq!(trends[0].logins, 1);
        let total_new: u32 = trends.iter().map(|t| t.new_users).sum();
        assert_eq!(total_new, 2);
    }

    #[tokio::test]
    async fn summary_counts_user_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.init().await.unwrap();
        store.record_user("1.1.1.1", "A").await.unwrap();
        store.record_user("2.2.2.2", "A").await.unwrap();
        store.record_user("1.1.1.1", "A").await.unwrap();

        let svc = UserStatsService::new(store);
        assert_eq!(svc.record_generation().await.unwrap(), 1);
        let summary = svc.summary(Utc::now().date_naive()).await;
        assert_eq!(summary.user_count, 2);
        assert_eq!(summary.system_stats.total_unique_users, 2);
        assert_eq!(summary.system_stats.total_generated_notes, 1);
        assert_eq!(summary.user_trends.len(), 30);
        assert_eq!(summary.user_trends[29].new_users, 2);
    }
}
