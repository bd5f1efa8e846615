use std::collections::HashMap;

use axum::{
    body::{Body, to_bytes},
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;
use utils::net::mask_ip;

use super::client_ip;
use crate::{error::ApiError, state::AppState};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Admin key from `?key=`, else from the JSON body's `adminKey`. The body is
/// buffered and handed on unchanged.
async fn admin_key(req: Request) -> Result<(Option<String>, Request), ApiError> {
    if let Ok(Query(query)) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        && let Some(key) = query.get("key").filter(|k| !k.is_empty())
    {
        return Ok((Some(key.clone()), req));
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::BadRequest("请求体过大".to_string()))?;
    let key = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("adminKey").and_then(|k| k.as_str()).map(str::to_string));
    Ok((key, Request::from_parts(parts, Body::from(bytes))))
}

/// An empty key never authorizes, even against an empty `ADMIN_KEY`.
fn key_matches(presented: Option<&str>, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    presented
        .filter(|k| !k.is_empty())
        .is_some_and(|k| bool::from(k.as_bytes().ct_eq(expected.as_bytes())))
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip::resolve(req.headers(), req.extensions());
    let path = req.uri().path().to_string();
    let (key, req) = admin_key(req).await?;

    let authorized = key_matches(key.as_deref(), &state.config.admin_key);
    if !authorized {
        warn!(ip = %mask_ip(&ip), path, "Rejected admin request");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keys_never_match() {
        assert!(key_matches(Some("secret"), "secret"));
        assert!(!key_matches(Some("secret2"), "secret"));
        assert!(!key_matches(Some(""), ""));
        assert!(!key_matches(None, ""));
        assert!(!key_matches(Some(""), "secret"));
    }
}
