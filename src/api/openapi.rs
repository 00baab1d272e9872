//! OpenAPI document assembly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::auth::types::{
    AuthResponse, ErrorResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResendOtpRequest, ResetPasswordRequest, UserResponse, VerifyOtpRequest,
};
use super::handlers::health::Health;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::auth::register::register,
        super::handlers::auth::verify::verify_otp,
        super::handlers::auth::verify::resend_otp,
        super::handlers::auth::login::login,
        super::handlers::auth::password::forgot_password,
        super::handlers::auth::password::reset_password,
        super::handlers::auth::me::me,
        super::handlers::health::health,
    ),
    components(schemas(
        RegisterRequest,
        VerifyOtpRequest,
        ResendOtpRequest,
        LoginRequest,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        AuthResponse,
        UserResponse,
        ErrorResponse,
        Health,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, verification, login, and password reset"),
        (name = "health", description = "Liveness and build info")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the OpenAPI document for the service.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
