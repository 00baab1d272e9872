//! Login endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::missing_payload;
use super::types::{AuthResponse, LoginRequest, UserResponse};
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted; token issued", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = super::types::ErrorResponse),
        (status = 403, description = "Email not verified yet", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service
        .login(&request.email, &request.password, request.remember_me)
        .await
    {
        Ok(grant) => {
            let response = AuthResponse {
                message: "Login successful".to_string(),
                access_token: Some(grant.token),
                user: Some(UserResponse::from(&grant.user)),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
