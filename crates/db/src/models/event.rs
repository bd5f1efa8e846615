use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// A single analytics event row. `timestamp`/`createdAt` are epoch milliseconds.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[sqlx(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub user_id: String,
    pub timestamp: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i64>,
    pub screen_height: Option<i64>,
    pub language: Option<String>,
    pub invite_code: Option<String>,
    /// Raw JSON text as stored.
    pub data: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub event_type: String,
    pub user_id: String,
    pub timestamp: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i64>,
    pub screen_height: Option<i64>,
    pub language: Option<String>,
    pub invite_code: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Optional WHERE constraints shared by every aggregate query.
/// `start`/`end` are inclusive epoch milliseconds.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub invite_code: Option<String>,
}

impl EventFilter {
    pub fn between(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    fn push_where<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(" WHERE 1=1");
        if let Some(event_type) = &self.event_type {
            qb.push(" AND eventType = ").push_bind(event_type.as_str());
        }
        if let Some(start) = self.start {
            qb.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = self.end {
            qb.push(" AND timestamp <= ").push_bind(end);
        }
        if let Some(code) = &self.invite_code {
            qb.push(" AND inviteCode = ").push_bind(code.as_str());
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct EventTypeCount {
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ParamValueCount {
    pub value: Option<String>,
    pub count: i64,
}

/// Grouping granularity for time series queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl TimeBucket {
    fn strftime(self) -> &'static str {
        match self {
            TimeBucket::Hour => "%Y-%m-%d %H:00",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Week => "%Y-%W",
            TimeBucket::Month => "%Y-%m",
        }
    }

    /// Lenient parse used by query strings: anything unknown is `Day`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.parse().ok()).unwrap_or_default()
    }
}

impl Event {
    pub async fn create(pool: &SqlitePool, data: &CreateEvent) -> Result<i64, sqlx::Error> {
        let timestamp = data.timestamp.unwrap_or_else(utils::time::now_millis);
        let payload = data
            .data
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "{}".to_string());

        let result = sqlx::query(
            r#"INSERT INTO events
                (eventType, userId, timestamp, ipAddress, userAgent, screenWidth, screenHeight, language, inviteCode, data)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&data.event_type)
        .bind(&data.user_id)
        .bind(timestamp)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .bind(data.screen_width)
        .bind(data.screen_height)
        .bind(&data.language)
        .bind(&data.invite_code)
        .bind(payload)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool, filter: &EventFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM events");
        filter.push_where(&mut qb);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn unique_users(pool: &SqlitePool, filter: &EventFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(DISTINCT userId) FROM events");
        filter.push_where(&mut qb);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn type_distribution(
        pool: &SqlitePool,
        filter: &EventFilter,
    ) -> Result<Vec<EventTypeCount>, sqlx::Error> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT eventType AS type, COUNT(*) AS count FROM events");
        filter.push_where(&mut qb);
        qb.push(" GROUP BY eventType ORDER BY count DESC");
        qb.build_query_as::<EventTypeCount>().fetch_all(pool).await
    }

    pub async fn time_series(
        pool: &SqlitePool,
        bucket: TimeBucket,
        filter: &EventFilter,
    ) -> Result<Vec<TimeSeriesPoint>, sqlx::Error> {
        // The format string is a server constant, never user input.
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT strftime('{}', timestamp / 1000, 'unixepoch') AS date, COUNT(*) AS count FROM events",
            bucket.strftime()
        ));
        filter.push_where(&mut qb);
        qb.push(" GROUP BY date ORDER BY date");
        qb.build_query_as::<TimeSeriesPoint>().fetch_all(pool).await
    }

    /// Value counts for one `param_select` parameter (e.g. `zodiac`).
    pub async fn param_distribution(
        pool: &SqlitePool,
        param_type: &str,
        filter: &EventFilter,
    ) -> Result<Vec<ParamValueCount>, sqlx::Error> {
        let scoped = EventFilter {
            event_type: Some("param_select".to_string()),
            ..filter.clone()
        };
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT CASE json_type(data, '$.paramValue')
                    WHEN 'true' THEN 'true'
                    WHEN 'false' THEN 'false'
                    ELSE CAST(json_extract(data, '$.paramValue') AS TEXT)
                END AS value,
                COUNT(*) AS count
               FROM events"#,
        );
        scoped.push_where(&mut qb);
        qb.push(" AND json_valid(data) AND json_extract(data, '$.paramType') = ")
            .push_bind(param_type);
        qb.push(" GROUP BY value ORDER BY count DESC");
        qb.build_query_as::<ParamValueCount>().fetch_all(pool).await
    }
}
