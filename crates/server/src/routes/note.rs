use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use services::services::{
    note_generator::{GeneratedNote, ServiceStatus},
    prompt::NoteParams,
};
use tracing::{debug, warn};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{middleware::rate_limit, state::AppState};

/// Always answers 200: failures are folded into fallback content.
pub async fn generate_note(State(state): State<AppState>, body: Bytes) -> ResponseJson<GeneratedNote> {
    let params: NoteParams = if body.is_empty() {
        NoteParams::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable note parameters, using defaults");
            NoteParams::default()
        })
    };
    let note = state.notes.generate(&params).await;
    debug!(
        model = %note.metadata.model,
        generation_time = note.metadata.generation_time,
        "Note ready"
    );
    ResponseJson(note)
}

pub async fn get_status(State(state): State<AppState>) -> ResponseJson<ServiceStatus> {
    ResponseJson(state.notes.status())
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub model: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub estimated_time: u64,
}

pub async fn get_estimated_time(
    State(state): State<AppState>,
    Query(query): Query<EstimateQuery>,
) -> ResponseJson<ApiResponse<Estimate>> {
    let model = query.model.as_deref().filter(|m| !m.is_empty());
    ResponseJson(ApiResponse::success(Estimate {
        estimated_time: state.notes.estimated_time(model),
    }))
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CommunityConfig {
    pub enable: bool,
    pub qrcode: String,
    pub title: String,
    pub description: String,
    pub show_after_generations: u32,
    pub show_for_new_users: bool,
    pub show_after_update: bool,
    pub prompts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct AppConfig {
    pub version: String,
    pub community: CommunityConfig,
}

#[derive(Debug, Serialize, TS)]
pub struct AppConfigBody {
    pub config: AppConfig,
}

pub fn app_config(state: &AppState) -> AppConfig {
    AppConfig {
        version: state.config.app_version.clone(),
        community: CommunityConfig {
            enable: true,
            qrcode: state.config.community_qrcode_url.clone(),
            title: "星语心笺反馈群".to_string(),
            description: "分享您的使用体验、提出产品建议、获取最新功能更新".to_string(),
            show_after_generations: 3,
            show_for_new_users: true,
            show_after_update: true,
            prompts: vec![
                "有任何使用建议？开发者期待您的反馈！".to_string(),
                "您的意见对我们至关重要，加入反馈群直接交流".to_string(),
                "想要更好的使用体验？加入群聊分享您的想法".to_string(),
            ],
        },
    }
}

pub async fn get_config(State(state): State<AppState>) -> ResponseJson<ApiResponse<AppConfigBody>> {
    ResponseJson(ApiResponse::success(AppConfigBody {
        config: app_config(&state),
    }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let generate = Router::new()
        .route("/generate", post(generate_note))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::note));

    Router::new()
        .merge(generate)
        .route("/status", get(get_status))
        .route("/estimated-time", get(get_estimated_time))
        .route("/config", get(get_config))
}
