//! Registration endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::missing_payload;
use super::types::{AuthResponse, RegisterRequest};
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; verification code emailed", body = AuthResponse),
        (status = 400, description = "Validation failure or email already registered", body = super::types::ErrorResponse),
        (status = 429, description = "Too many registration attempts", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service
        .register(&request.full_name, &request.email, &request.password)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(AuthResponse::message(
                "Registration successful. Please check your email for verification code.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
