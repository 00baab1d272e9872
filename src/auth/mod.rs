//! Core authentication state machine and its security-sensitive policies.
//!
//! The submodules map one-to-one onto the moving parts of the system:
//! credential hashing ([`hasher`]), bearer tokens ([`token`]), sliding-window
//! rate limiting ([`rate_limit`]), OTP lifecycle ([`otp`]), persistence
//! ([`store`]), and the orchestrating flows ([`service`]).

pub mod config;
pub mod error;
pub mod hasher;
pub mod models;
pub mod otp;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use hasher::CredentialHasher;
pub use models::{OtpPurpose, OtpRecord, User};
pub use otp::OtpManager;
pub use rate_limit::{
    NoopRateLimiter, RateLimitAction, RateLimitConfig, RateLimitDecision, RateLimiter,
    SlidingWindowRateLimiter,
};
pub use service::{AuthService, LoginGrant};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
pub use token::{Claims, TokenService};
