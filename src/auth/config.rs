//! Auth policy configuration.

use secrecy::SecretString;

use super::rate_limit::RateLimitConfig;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Tunable policy knobs for the auth flows.
///
/// Defaults are the design constants; deployments override them through the
/// CLI/env surface.
#[derive(Debug, Default)]
pub struct AuthConfig {
    token_secret: Option<SecretString>,
    token_ttl_hours: Option<i64>,
    otp_ttl_minutes: Option<i64>,
    rate_limits: Option<RateLimitConfig>,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token_secret(mut self, secret: SecretString) -> Self {
        self.token_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn with_token_ttl_hours(mut self, hours: i64) -> Self {
        self.token_ttl_hours = Some(hours);
        self
    }

    #[must_use]
    pub fn with_otp_ttl_minutes(mut self, minutes: i64) -> Self {
        self.otp_ttl_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_rate_limits(mut self, limits: RateLimitConfig) -> Self {
        self.rate_limits = Some(limits);
        self
    }

    /// Externally supplied signing secret, if any. When absent the server
    /// generates one at startup and tokens do not survive a restart.
    #[must_use]
    pub fn token_secret(&self) -> Option<&SecretString> {
        self.token_secret.as_ref()
    }

    #[must_use]
    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
    }

    #[must_use]
    pub fn otp_ttl_minutes(&self) -> i64 {
        self.otp_ttl_minutes.unwrap_or(DEFAULT_OTP_TTL_MINUTES)
    }

    #[must_use]
    pub fn rate_limits(&self) -> RateLimitConfig {
        self.rate_limits.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rate_limit::{RateLimitAction, RateLimitRule};
    use std::time::Duration;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new();
        assert!(config.token_secret().is_none());
        assert_eq!(config.token_ttl_hours(), 24);
        assert_eq!(config.otp_ttl_minutes(), 10);

        let config = config
            .with_token_secret(SecretString::from("secret"))
            .with_token_ttl_hours(1)
            .with_otp_ttl_minutes(5)
            .with_rate_limits(
                RateLimitConfig::default()
                    .with_register(RateLimitRule::new(2, Duration::from_secs(60))),
            );

        assert!(config.token_secret().is_some());
        assert_eq!(config.token_ttl_hours(), 1);
        assert_eq!(config.otp_ttl_minutes(), 5);
        assert_eq!(config.rate_limits().rule(RateLimitAction::Register).limit, 2);
    }
}
