//! # Sesamo
//!
//! `sesamo` is an email/password authentication service with one-time-passcode
//! (OTP) based email verification and password reset.
//!
//! ## Flows
//!
//! - **Register** creates an unverified account and emails a 6-digit
//!   verification code. Login is locked until the code is consumed.
//! - **Login** issues a signed bearer token once credentials check out and the
//!   email is verified.
//! - **Forgot/Reset password** uses the same OTP machinery with a separate
//!   `reset` purpose; responses never reveal whether an email is registered.
//!
//! ## Security posture
//!
//! Passwords are stored as salted Argon2id digests. OTP codes come from the OS
//! CSPRNG, expire after ten minutes, and are single-use: consumption is one
//! atomic check-and-set against the store. Registration, OTP resend, and
//! forgot-password are rate limited per email over a sliding window.
//!
//! Tokens are stateless HS256 JWTs; there is no revocation list, so `/me`
//! re-checks that the subject still exists.

pub mod api;
pub mod auth;
pub mod cli;
pub mod email;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
