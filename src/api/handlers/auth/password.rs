//! Forgot-password and reset-password endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::missing_payload;
use super::types::{AuthResponse, ForgotPasswordRequest, ResetPasswordRequest};
use crate::auth::AuthService;

/// One message for both the registered and unregistered branches; the bodies
/// must be indistinguishable to prevent email enumeration.
const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, a password reset code has been sent.";

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Accepted; identical whether or not the email is registered", body = AuthResponse),
        (status = 429, description = "Too many reset requests", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.forgot_password(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(AuthResponse::message(FORGOT_PASSWORD_MESSAGE)),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced; login with the new password", body = AuthResponse),
        (status = 400, description = "Invalid or expired reset code", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service
        .reset_password(&request.email, &request.otp, &request.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(AuthResponse::message(
                "Password reset successfully. You can now login with your new password.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
