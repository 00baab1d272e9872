//! Error taxonomy for the authentication flows.
//!
//! Every flow terminates in success or exactly one of these variants; nothing
//! is retried by the core. `InvalidCredentials` and `InvalidOrExpiredOtp`
//! deliberately collapse distinguishable internal causes into one message so
//! responses cannot be used to enumerate accounts or probe code expiry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("User not found")]
    UserNotFound,

    /// Unknown email and wrong password are indistinguishable on purpose.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email not verified. Please verify your email before logging in.")]
    EmailNotVerified,

    #[error("Invalid authentication credentials")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    /// Persistence or other infrastructure faults; the caller sees a generic
    /// message while the cause is logged server-side.
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}
