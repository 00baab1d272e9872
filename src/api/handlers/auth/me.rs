//! Current-user endpoint (bearer authenticated).

use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::types::UserResponse;
use crate::auth::{AuthError, AuthService};

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing, malformed, or expired token", body = super::types::ErrorResponse),
        (status = 404, description = "Account deleted after the token was issued", body = super::types::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(service: Extension<Arc<AuthService>>, headers: HeaderMap) -> Response {
    let Some(token) = extract_bearer_token(&headers) else {
        return AuthError::InvalidToken.into_response();
    };

    match service.whoami(&token).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Err(err) => err.into_response(),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
