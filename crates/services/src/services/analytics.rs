//! Event ingestion and the aggregate views served to the dashboard.

use chrono::{DateTime, Local};
use db::{
    DBService,
    models::event::{
        CreateEvent, Event, EventFilter, EventTypeCount, ParamValueCount, TimeBucket,
        TimeSeriesPoint,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils::time::{now_millis, today_and_yesterday_bounds};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("missing required field: eventType or userId")]
    MissingFields,
    #[error("event store is not connected")]
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: i64,
    /// Whole percent of all events in range.
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_events: i64,
    pub unique_user_count: i64,
    pub event_type_distribution: Vec<TypeShare>,
    pub time_series_data: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ParamStats {
    pub zodiac: Vec<ParamValueCount>,
    pub mbti: Vec<ParamValueCount>,
    pub mood: Vec<ParamValueCount>,
    pub bilingual: Vec<ParamValueCount>,
    pub sarcasm: Vec<ParamValueCount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub today_events: i64,
    pub yesterday_events: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeAnalytics {
    pub unique_user_count: i64,
    pub event_type_counts: Vec<EventTypeCount>,
    pub note_generate_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PreciseTypeShare {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: i64,
    /// Two-decimal percentage, e.g. `"12.50"`.
    pub percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalytics {
    pub total_events: i64,
    pub unique_user_count: i64,
    pub event_type_distribution: Vec<PreciseTypeShare>,
    pub time_series_data: Vec<TimeSeriesPoint>,
}

fn share(count: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: DBService,
}

impl AnalyticsService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    /// Store one client event. The caller has already attached the request
    /// IP, user agent and invite-code cookie.
    pub async fn track(&self, event: CreateEvent) -> Result<i64, EventError> {
        if event.event_type.trim().is_empty() || event.user_id.trim().is_empty() {
            return Err(EventError::MissingFields);
        }
        tracing::debug!(event_type = %event.event_type, "Recording event");
        let id = Event::create(&self.db.pool, &event).await?;
        Ok(id)
    }

    pub async fn overview(
        &self,
        filter: &EventFilter,
        bucket: TimeBucket,
    ) -> Result<Overview, EventError> {
        let pool = &self.db.pool;
        let total_events = Event::count(pool, filter).await?;
        let unique_user_count = Event::unique_users(pool, filter).await?;
        let distribution = Event::type_distribution(pool, filter).await?;
        let time_series_data = Event::time_series(pool, bucket, filter).await?;

        Ok(Overview {
            total_events,
            unique_user_count,
            event_type_distribution: distribution
                .into_iter()
                .map(|t| TypeShare {
                    percentage: share(t.count, total_events).round() as i64,
                    event_type: t.event_type,
                    count: t.count,
                })
                .collect(),
            time_series_data,
        })
    }

    /// Raw per-type counts, most frequent first.
    pub async fn type_counts(&self, filter: &EventFilter) -> Result<Vec<EventTypeCount>, EventError> {
        Ok(Event::type_distribution(&self.db.pool, filter).await?)
    }

    pub async fn params(&self, filter: &EventFilter) -> Result<ParamStats, EventError> {
        let pool = &self.db.pool;
        Ok(ParamStats {
            zodiac: Event::param_distribution(pool, "zodiac", filter).await?,
            mbti: Event::param_distribution(pool, "mbti", filter).await?,
            mood: Event::param_distribution(pool, "mood", filter).await?,
            bilingual: Event::param_distribution(pool, "bilingual", filter).await?,
            sarcasm: Event::param_distribution(pool, "sarcasm", filter).await?,
        })
    }

    /// Event counts since local midnight and for the whole previous day.
    pub async fn daily(&self, now: DateTime<Local>) -> Result<DailyStats, EventError> {
        let (today, yesterday) = today_and_yesterday_bounds(now);
        let pool = &self.db.pool;
        let today_events = Event::count(
            pool,
            &EventFilter {
                start: Some(today),
                ..Default::default()
            },
        )
        .await?;
        let yesterday_events = Event::count(pool, &EventFilter::between(yesterday, today - 1)).await?;
        Ok(DailyStats {
            today_events,
            yesterday_events,
        })
    }

    pub async fn invite_code_stats(
        &self,
        code: &str,
        filter: &EventFilter,
    ) -> Result<InviteCodeAnalytics, EventError> {
        let pool = &self.db.pool;
        let scoped = EventFilter {
            invite_code: Some(code.to_string()),
            ..filter.clone()
        };
        let unique_user_count = Event::unique_users(pool, &scoped).await?;
        let event_type_counts = Event::type_distribution(pool, &scoped).await?;
        let note_generate_count = Event::count(
            pool,
            &EventFilter {
                event_type: Some("note_generate".to_string()),
                ..scoped.clone()
            },
        )
        .await?;
        Ok(InviteCodeAnalytics {
            unique_user_count,
            event_type_counts,
            note_generate_count,
        })
    }

    /// Admin view: defaults to the last 30 days; `group_by` is `hour`,
    /// `day`, or anything else for ISO-style `YYYY-Www` weeks.
    pub async fn event_analytics(
        &self,
        start: Option<i64>,
        end: Option<i64>,
        group_by: Option<&str>,
    ) -> Result<EventAnalytics, EventError> {
        if !self.db.is_connected().await {
            return Err(EventError::Unavailable);
        }
        let end = end.unwrap_or_else(now_millis);
        let start = start.unwrap_or(end - 30 * DAY_MS);
        let filter = EventFilter::between(start, end);
        let pool = &self.db.pool;

        let total_events = Event::count(pool, &filter).await?;
        let unique_user_count = Event::unique_users(pool, &filter).await?;
        let distribution = Event::type_distribution(pool, &filter).await?;
        let bucket = match group_by {
            Some("hour") => TimeBucket::Hour,
            Some("day") => TimeBucket::Day,
            _ => TimeBucket::Week,
        };
        let mut time_series_data = Event::time_series(pool, bucket, &filter).await?;
        if bucket == TimeBucket::Week {
            for point in &mut time_series_data {
                if let Some((year, week)) = point.date.split_once('-') {
                    point.date = format!("{year}-W{week}");
                }
            }
        }

        Ok(EventAnalytics {
            total_events,
            unique_user_count,
            event_type_distribution: distribution
                .into_iter()
                .map(|t| PreciseTypeShare {
                    percentage: format!("{:.2}", share(t.count, total_events)),
                    event_type: t.event_type,
                    count: t.count,
                })
                .collect(),
            time_series_data,
        })
    }
}
