//! Auth endpoint handlers.
//!
//! Thin axum wrappers over [`AuthService`]: decode the payload, run the flow,
//! map the outcome onto the HTTP error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::auth::AuthError;

pub mod login;
pub mod me;
pub mod password;
pub mod register;
pub mod types;
pub mod verify;

use types::ErrorResponse;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::EmailTaken
            | AuthError::InvalidOrExpiredOtp
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Internal(err) => {
                // The caller only ever sees the generic message.
                error!("Request failed: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(&self.to_string()))).into_response()
    }
}

/// Uniform 400 for requests with no JSON body.
pub(super) fn missing_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Missing payload")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        assert_eq!(
            AuthError::EmailTaken.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::InvalidOrExpiredOtp.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::EmailNotVerified.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Validation("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::from(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
