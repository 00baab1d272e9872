//! OTP verification and resend endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::missing_payload;
use super::types::{AuthResponse, ResendOtpRequest, VerifyOtpRequest};
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified; login unlocked", body = AuthResponse),
        (status = 400, description = "Invalid or expired OTP", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.verify_otp(&request.email, &request.otp).await {
        Ok(()) => (
            StatusCode::OK,
            Json(AuthResponse::message(
                "Email verified successfully. You can now login.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "Fresh verification code emailed", body = AuthResponse),
        (status = 404, description = "No account for that email", body = super::types::ErrorResponse),
        (status = 429, description = "Too many resend requests", body = super::types::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResendOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.resend_otp(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(AuthResponse::message(
                "New verification code sent to your email.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
