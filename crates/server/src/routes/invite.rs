//! Login-time invite verification and the legacy admin endpoints that take
//! the key in the request body.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Local;
use db::models::invite_code::InviteCode;
use serde::{Deserialize, Serialize};
use services::services::{
    invites::{InviteCodeStat, Verification},
    user_stats::UserSummary,
};
use tracing::info;
use ts_rs::TS;
use utils::{net::mask_ip, response::ApiResponse};

use crate::{
    error::ApiError,
    middleware::{ClientIp, rate_limit, require_admin},
    state::AppState,
};

pub const INVITE_COOKIE: &str = "inviteCode";
const COOKIE_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyInviteRequest {
    pub invite_code: Option<String>,
    #[serde(rename = "clientIP")]
    pub client_ip: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct VerifyInviteResponse {
    pub valid: bool,
    pub message: String,
}

impl VerifyInviteResponse {
    fn new(valid: bool, message: &str) -> Self {
        Self {
            valid,
            message: message.to_string(),
        }
    }
}

pub async fn verify_invite_code(
    State(state): State<AppState>,
    ClientIp(peer_ip): ClientIp,
    jar: CookieJar,
    ResponseJson(payload): ResponseJson<VerifyInviteRequest>,
) -> Result<(StatusCode, CookieJar, ResponseJson<VerifyInviteResponse>), ApiError> {
    let ip = payload
        .client_ip
        .filter(|ip| !ip.trim().is_empty())
        .unwrap_or(peer_ip);
    let Some(code) = payload
        .invite_code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
    else {
        info!(ip = %mask_ip(&ip), "Invite verification without a code");
        return Ok((
            StatusCode::BAD_REQUEST,
            jar,
            ResponseJson(VerifyInviteResponse::new(false, "请提供邀请码")),
        ));
    };

    let response = match state.invites.verify(&code, &ip).await? {
        Verification::Unknown => VerifyInviteResponse::new(false, "无效的邀请码"),
        Verification::LimitReached => VerifyInviteResponse::new(false, "此邀请码已达到使用上限"),
        Verification::Valid => {
            let cookie = Cookie::build((INVITE_COOKIE, code))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::days(COOKIE_DAYS))
                .build();
            return Ok((
                StatusCode::OK,
                jar.add(cookie),
                ResponseJson(VerifyInviteResponse::new(true, "邀请码验证成功")),
            ));
        }
    };
    Ok((StatusCode::OK, jar, ResponseJson(response)))
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub summary: UserSummary,
    pub invite_code_stats: Vec<InviteCodeStat>,
}

pub async fn load_stats(state: &AppState) -> Result<StatsResponse, ApiError> {
    Ok(StatsResponse {
        summary: state.user_stats.summary(Local::now().date_naive()).await,
        invite_code_stats: state.invites.list().await?,
    })
}

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<StatsResponse>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(load_stats(&state).await?)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodeRequest {
    pub max_uses: Option<i64>,
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    pub invite_code: String,
}

pub async fn create_code(
    state: &AppState,
    payload: GenerateCodeRequest,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GeneratedCode>>), ApiError> {
    let created = state
        .invites
        .generate(payload.prefix.as_deref(), payload.max_uses)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            GeneratedCode {
                invite_code: created.code,
            },
            "邀请码生成成功",
        )),
    ))
}

pub async fn generate_invite_code(
    State(state): State<AppState>,
    ResponseJson(payload): ResponseJson<GenerateCodeRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GeneratedCode>>), ApiError> {
    create_code(&state, payload).await
}

#[derive(Debug, Deserialize)]
pub struct DeleteCodeRequest {
    pub code: Option<String>,
}

pub async fn remove_code(state: &AppState, code: Option<&str>) -> Result<ApiResponse<()>, ApiError> {
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("请提供要删除的邀请码".to_string()))?;
    state.invites.delete(code).await?;
    Ok(ApiResponse::ok_with_message("邀请码删除成功"))
}

pub async fn delete_invite_code(
    State(state): State<AppState>,
    ResponseJson(payload): ResponseJson<DeleteCodeRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Ok(ResponseJson(remove_code(&state, payload.code.as_deref()).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCodeRequest {
    pub code: Option<String>,
    pub new_max_uses: Option<i64>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCode {
    pub updated_code: InviteCode,
}

pub async fn change_code(
    state: &AppState,
    code: Option<&str>,
    new_max_uses: Option<i64>,
) -> Result<ApiResponse<UpdatedCode>, ApiError> {
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("请提供要编辑的邀请码".to_string()))?;
    let updated_code = state.invites.edit(code, new_max_uses).await?;
    Ok(ApiResponse::success_with_message(
        UpdatedCode { updated_code },
        "邀请码更新成功",
    ))
}

pub async fn edit_invite_code(
    State(state): State<AppState>,
    ResponseJson(payload): ResponseJson<EditCodeRequest>,
) -> Result<ResponseJson<ApiResponse<UpdatedCode>>, ApiError> {
    Ok(ResponseJson(
        change_code(&state, payload.code.as_deref(), payload.new_max_uses).await?,
    ))
}

pub async fn record_generation(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let total = state.user_stats.record_generation().await?;
    tracing::debug!(total, "Recorded note generation");
    Ok(ResponseJson(ApiResponse::ok()))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/stats", get(get_stats))
        .route("/delete-invite-code", post(delete_invite_code))
        .route("/edit-invite-code", post(edit_invite_code))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let generate = Router::new()
        .route("/generate-invite-code", post(generate_invite_code))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::generate_code));

    Router::new()
        .route("/verify-invite-code", post(verify_invite_code))
        .route("/record-generation", post(record_generation))
        .merge(admin)
        .merge(generate)
}
