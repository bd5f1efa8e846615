//! `/api/admin`: dashboard, invite-code management and event analytics.
//! Every route requires the admin key.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::Local;
use db::models::event::{EventFilter, EventTypeCount};
use serde::{Deserialize, Serialize};
use services::services::analytics::{EventAnalytics, InviteCodeAnalytics};
use tracing::error;
use ts_rs::TS;
use utils::response::ApiResponse;

use super::{
    RangeQuery,
    events::AnalyticsBody,
    invite::{self, GenerateCodeRequest, GeneratedCode, StatsResponse, UpdatedCode},
};
use crate::{error::ApiError, middleware::require_admin, state::AppState};

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub today_events: i64,
    pub yesterday_events: i64,
    pub event_type_distribution: Vec<EventTypeCount>,
}

/// Event figures degrade to an error marker instead of failing the page.
#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
pub enum DashboardEvents {
    Stats(EventStats),
    Failed { error: String },
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    #[ts(flatten)]
    pub stats: StatsResponse,
    pub event_stats: DashboardEvents,
}

async fn event_stats(state: &AppState) -> DashboardEvents {
    let result = async {
        let daily = state.analytics.daily(Local::now()).await?;
        let distribution = state.analytics.type_counts(&EventFilter::default()).await?;
        Ok::<_, ApiError>(EventStats {
            today_events: daily.today_events,
            yesterday_events: daily.yesterday_events,
            event_type_distribution: distribution,
        })
    }
    .await;

    match result {
        Ok(stats) => DashboardEvents::Stats(stats),
        Err(e) => {
            error!(error = %e, "Failed to load event statistics");
            DashboardEvents::Failed {
                error: "获取事件统计失败".to_string(),
            }
        }
    }
}

pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Dashboard>>, ApiError> {
    let stats = invite::load_stats(&state).await?;
    let event_stats = event_stats(&state).await;
    Ok(ResponseJson(ApiResponse::success(Dashboard { stats, event_stats })))
}

pub async fn create_invite_code(
    State(state): State<AppState>,
    ResponseJson(payload): ResponseJson<GenerateCodeRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GeneratedCode>>), ApiError> {
    invite::create_code(&state, payload).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMaxUses {
    pub new_max_uses: Option<i64>,
}

pub async fn update_invite_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ResponseJson(payload): ResponseJson<EditMaxUses>,
) -> Result<ResponseJson<ApiResponse<UpdatedCode>>, ApiError> {
    Ok(ResponseJson(
        invite::change_code(&state, Some(&code), payload.new_max_uses).await?,
    ))
}

pub async fn delete_invite_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Ok(ResponseJson(invite::remove_code(&state, Some(&code)).await?))
}

pub async fn get_invite_code_analytics(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<AnalyticsBody<InviteCodeAnalytics>>>, ApiError> {
    let analytics = state
        .analytics
        .invite_code_stats(&code, &query.filter())
        .await?;
    Ok(ResponseJson(ApiResponse::success(AnalyticsBody { analytics })))
}

pub async fn get_event_analytics(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<AnalyticsBody<EventAnalytics>>>, ApiError> {
    let analytics = state
        .analytics
        .event_analytics(query.start(), query.end(), query.group_by.as_deref())
        .await?;
    Ok(ResponseJson(ApiResponse::success(AnalyticsBody { analytics })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/invite-code", post(create_invite_code))
        .route(
            "/invite-code/{code}",
            put(update_invite_code).delete(delete_invite_code),
        )
        .route("/invite-code/{code}/analytics", get(get_invite_code_analytics))
        .route("/event-analytics", get(get_event_analytics))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}
