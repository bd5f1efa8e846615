use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};

/// Milliseconds since the Unix epoch, the unit every stored timestamp uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn millis_to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// Local midnight of `now` and of the day before, in epoch milliseconds.
pub fn today_and_yesterday_bounds(now: DateTime<Local>) -> (i64, i64) {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let today = Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis());
    (today, today - 24 * 60 * 60 * 1000)
}

/// Parse a `startDate`/`endDate` query value: RFC 3339, `YYYY-MM-DD`, or raw
/// epoch milliseconds.
pub fn parse_date_param(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
    }
    raw.parse::<i64>().ok()
}
