use axum::{Router, response::Json as ResponseJson, routing::get};
use chrono::{Local, SecondsFormat, Utc};
use serde::Serialize;
use services::services::prompt::time::date_info;
use ts_rs::TS;

use crate::state::AppState;

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DateInfoResponse {
    pub date: String,
    pub lunar_date: String,
    pub animal: String,
    pub festivals: Vec<String>,
    pub week_day: String,
    /// Empty when today is not a solar term.
    pub solar_term: String,
    pub astro: String,
    pub day_type: String,
    pub success: bool,
}

pub async fn get_date_info() -> ResponseJson<DateInfoResponse> {
    let info = date_info(Local::now().date_naive());
    ResponseJson(DateInfoResponse {
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        lunar_date: info.lunar_date,
        animal: info.animal,
        festivals: info.festivals,
        week_day: info.week_day,
        solar_term: info.solar_term.unwrap_or_default(),
        astro: info.astro,
        day_type: info.day_type,
        success: true,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dateInfo", get(get_date_info))
}
