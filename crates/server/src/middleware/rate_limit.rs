use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use services::services::rate_limit::RateLimiter;
use tracing::warn;
use utils::net::mask_ip;

use super::client_ip;
use crate::{error::ApiError, state::AppState};

const TOO_MANY_REQUESTS: &str = "请求过于频繁，请稍后再试";
const TOO_MANY_ATTEMPTS: &str = "尝试次数过多，请稍后再试";

fn check(
    limiter: &RateLimiter,
    req: &Request,
    per_path: bool,
    message: &'static str,
    report_retry: bool,
) -> Result<(), ApiError> {
    let ip = client_ip::resolve(req.headers(), req.extensions());
    let path = req.uri().path();
    let key = if per_path {
        format!("{ip}-{path}")
    } else {
        ip.clone()
    };
    limiter.check(&key).map_err(|retry_after| {
        warn!(
            limiter = limiter.name(),
            ip = %mask_ip(&ip),
            path,
            retry_after,
            "Rate limit reached"
        );
        ApiError::RateLimited {
            message,
            retry_after: report_retry.then_some(retry_after),
        }
    })
}

/// 100 requests per 15 minutes per IP across `/api`.
pub async fn api(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    check(&state.limiters.global, &req, false, TOO_MANY_REQUESTS, false)?;
    Ok(next.run(req).await)
}

pub async fn generate_code(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check(&state.limiters.generate_code, &req, false, TOO_MANY_ATTEMPTS, false)?;
    Ok(next.run(req).await)
}

pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    check(&state.limiters.track, &req, true, TOO_MANY_REQUESTS, true)?;
    Ok(next.run(req).await)
}

pub async fn note(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    check(&state.limiters.note, &req, false, TOO_MANY_REQUESTS, true)?;
    Ok(next.run(req).await)
}
