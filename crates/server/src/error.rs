use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::json_store::StoreError;
use serde_json::json;
use services::services::{analytics::EventError, invites::InviteError};
use thiserror::Error;
use utils::response::ApiResponse;

pub const INTERNAL_ERROR_MESSAGE: &str = "服务器内部错误";
pub const UNAUTHORIZED_MESSAGE: &str = "未授权访问，需要管理员权限";

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include error details in 500 bodies. Enabled for `APP_ENV=development`.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Invite(#[from] InviteError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limited: {message}")]
    RateLimited {
        message: &'static str,
        /// When set the body carries `retryAfter` seconds; otherwise it uses
        /// the `{status, message}` shape of the global limiter.
        retry_after: Option<u64>,
    },
}

impl ApiError {
    fn client_error(&self) -> Option<(StatusCode, String)> {
        let bad = StatusCode::BAD_REQUEST;
        match self {
            ApiError::BadRequest(msg) => Some((bad, msg.clone())),
            ApiError::NotFound(msg) => Some((StatusCode::NOT_FOUND, msg.clone())),
            ApiError::Unauthorized => Some((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.into())),
            ApiError::Invite(InviteError::MissingCode) => Some((bad, "请提供邀请码".into())),
            ApiError::Invite(InviteError::InvalidMaxUses) => {
                Some((bad, "请提供有效的使用次数".into()))
            }
            ApiError::Invite(InviteError::NotFound) => {
                Some((StatusCode::NOT_FOUND, "邀请码不存在".into()))
            }
            ApiError::Event(EventError::MissingFields) => {
                Some((bad, "缺少必要字段: eventType 或 userId".into()))
            }
            ApiError::Event(EventError::Unavailable) => Some((
                StatusCode::SERVICE_UNAVAILABLE,
                "SQLite未连接，无法获取事件分析".into(),
            )),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::RateLimited {
            message,
            retry_after,
        } = self
        {
            let body = match retry_after {
                Some(secs) => json!({"success": false, "message": message, "retryAfter": secs}),
                None => json!({"status": 429, "message": message}),
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }

        if let Some((status, message)) = self.client_error() {
            return (status, Json(ApiResponse::error(message))).into_response();
        }

        tracing::error!(error = %self, "Request failed");
        let mut body = json!({"success": false, "message": INTERNAL_ERROR_MESSAGE});
        if EXPOSE_DETAILS.load(Ordering::Relaxed) {
            body["error"] = json!(self.to_string());
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_errors_to_status() {
        let cases = [
            (ApiError::Invite(InviteError::NotFound), StatusCode::NOT_FOUND),
            (ApiError::Invite(InviteError::InvalidMaxUses), StatusCode::BAD_REQUEST),
            (ApiError::Event(EventError::Unavailable), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Invite(InviteError::Exhausted), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::RateLimited { message: "x", retry_after: Some(3) },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
