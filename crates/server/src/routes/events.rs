use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, header::USER_AGENT},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Local;
use db::models::event::{CreateEvent, TimeBucket};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use services::services::analytics::{DailyStats, Overview, ParamStats};
use ts_rs::TS;
use utils::{response::ApiResponse, time::parse_date_param};

use super::{RangeQuery, invite::INVITE_COOKIE};
use crate::{
    error::ApiError,
    middleware::{ClientIp, rate_limit, require_admin},
    state::AppState,
};

/// Body of `POST /api/track`. The timestamp may be an ISO string or epoch
/// milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRequest {
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: Option<Value>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i64>,
    pub screen_height: Option<i64>,
    pub language: Option<String>,
    pub data: Option<Value>,
}

fn timestamp_millis(raw: Option<&Value>) -> Option<i64> {
    match raw? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_date_param(s),
        _ => None,
    }
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Tracked {
    pub event_id: i64,
}

pub async fn track_event(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    jar: CookieJar,
    ResponseJson(payload): ResponseJson<TrackRequest>,
) -> Result<ResponseJson<ApiResponse<Tracked>>, ApiError> {
    let header_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let event = CreateEvent {
        event_type: payload.event_type.unwrap_or_default(),
        user_id: payload.user_id.unwrap_or_default(),
        timestamp: timestamp_millis(payload.timestamp.as_ref()),
        ip_address: Some(ip),
        user_agent: payload.user_agent.filter(|ua| !ua.is_empty()).or(header_agent),
        screen_width: payload.screen_width,
        screen_height: payload.screen_height,
        language: payload.language,
        invite_code: jar.get(INVITE_COOKIE).map(|c| c.value().to_string()),
        data: payload.data,
    };
    let event_id = state.analytics.track(event).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        Tracked { event_id },
        "事件记录成功",
    )))
}

#[derive(Debug, Serialize, TS)]
pub struct AnalyticsBody<T> {
    pub analytics: T,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ParamStatsBody {
    pub param_stats: ParamStats,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatsBody {
    pub daily_stats: DailyStats,
}

pub async fn get_overview(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<AnalyticsBody<Overview>>>, ApiError> {
    let bucket = TimeBucket::parse_or_default(query.group_by.as_deref());
    let analytics = state.analytics.overview(&query.filter(), bucket).await?;
    Ok(ResponseJson(ApiResponse::success(AnalyticsBody { analytics })))
}

pub async fn get_param_stats(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<ParamStatsBody>>, ApiError> {
    let param_stats = state.analytics.params(&query.filter()).await?;
    Ok(ResponseJson(ApiResponse::success(ParamStatsBody { param_stats })))
}

pub async fn get_daily_stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<DailyStatsBody>>, ApiError> {
    let daily_stats = state.analytics.daily(Local::now()).await?;
    Ok(ResponseJson(ApiResponse::success(DailyStatsBody { daily_stats })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let track = Router::new()
        .route("/track", post(track_event))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::track));

    let analytics = Router::new()
        .route("/overview", get(get_overview))
        .route("/params", get(get_param_stats))
        .route("/daily", get(get_daily_stats))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new().merge(track).nest("/analytics", analytics)
}
