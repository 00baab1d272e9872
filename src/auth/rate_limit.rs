//! Sliding-window rate limiting for sensitive auth flows.
//!
//! The window trails `now` continuously rather than aligning to fixed
//! buckets, so a burst straddling a bucket edge is still bounded. State is
//! process-local and ephemeral: a restart resets every window. That is an
//! accepted limitation for single-instance deployments; multi-instance
//! setups need a shared backing store behind the same trait.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Operation classes with their own windows.
///
/// Login and OTP verification are deliberately not listed: they are not rate
/// limited in this design.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    Register,
    ResendOtp,
    ForgotPassword,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

/// Maximum number of admitted attempts within the trailing window.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitRule {
    pub limit: usize,
    pub window: Duration,
}

impl RateLimitRule {
    #[must_use]
    pub const fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Per-action rules; the defaults are design constants.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    register: RateLimitRule,
    resend_otp: RateLimitRule,
    forgot_password: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            register: RateLimitRule::new(5, Duration::from_secs(15 * 60)),
            resend_otp: RateLimitRule::new(3, Duration::from_secs(5 * 60)),
            forgot_password: RateLimitRule::new(3, Duration::from_secs(15 * 60)),
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn rule(&self, action: RateLimitAction) -> RateLimitRule {
        match action {
            RateLimitAction::Register => self.register,
            RateLimitAction::ResendOtp => self.resend_otp,
            RateLimitAction::ForgotPassword => self.forgot_password,
        }
    }

    #[must_use]
    pub fn with_register(mut self, rule: RateLimitRule) -> Self {
        self.register = rule;
        self
    }

    #[must_use]
    pub fn with_resend_otp(mut self, rule: RateLimitRule) -> Self {
        self.resend_otp = rule;
        self
    }

    #[must_use]
    pub fn with_forgot_password(mut self, rule: RateLimitRule) -> Self {
        self.forgot_password = rule;
        self
    }
}

/// Injected rate-limiting seam so flows can be unit-tested without shared
/// global state.
pub trait RateLimiter: Send + Sync {
    fn check(&self, email: &str, action: RateLimitAction) -> RateLimitDecision;
}

/// Allows everything; local development and tests.
#[derive(Clone, Copy, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _email: &str, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-memory sliding-window limiter keyed by (action, email).
///
/// Each entry guard holds its shard lock for the whole prune-count-record
/// sequence, so two concurrent requests for the same key cannot both observe
/// "under limit" and slip past it.
pub struct SlidingWindowRateLimiter {
    config: RateLimitConfig,
    windows: DashMap<(RateLimitAction, String), Vec<Instant>>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    fn check_at(
        &self,
        email: &str,
        action: RateLimitAction,
        now: Instant,
    ) -> RateLimitDecision {
        let rule = self.config.rule(action);
        let mut attempts = self
            .windows
            .entry((action, email.to_string()))
            .or_default();

        attempts.retain(|instant| now.saturating_duration_since(*instant) < rule.window);

        if attempts.len() >= rule.limit {
            // Rejected attempts are not recorded; only admitted ones count.
            return RateLimitDecision::Limited;
        }

        attempts.push(now);
        RateLimitDecision::Allowed
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check(&self, email: &str, action: RateLimitAction) -> RateLimitDecision {
        self.check_at(email, action, Instant::now())
    }
}
