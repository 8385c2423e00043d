use std::str::FromStr;

use axum::http::HeaderMap;

use events_domain::{RuntimeConfig, UserId};

use crate::error::HttpError;

/// Header set by the gateway after it has authenticated the caller.
pub const REQUESTER_HEADER: &str = "X-User-Id";

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Checks the shared API token, then resolves the requesting user.
pub fn authenticate(config: &RuntimeConfig, headers: &HeaderMap) -> Result<UserId, HttpError> {
    if !authorize(config, headers) {
        return Err(HttpError::Unauthorized);
    }
    requester_id(headers)
}

pub fn requester_id(headers: &HeaderMap) -> Result<UserId, HttpError> {
    let value = headers
        .get(REQUESTER_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(HttpError::Unauthorized)?;
    match UserId::from_str(value) {
        Ok(user_id) if !user_id.is_nil() => Ok(user_id),
        _ => Err(HttpError::Unauthorized),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
