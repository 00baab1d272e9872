//! Token and OTP policy arguments.

use clap::{Arg, ArgMatches, Command};

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_HOURS: &str = "token-ttl-hours";
pub const ARG_OTP_TTL_MINUTES: &str = "otp-ttl-minutes";

#[derive(Debug, Clone)]
pub struct Options {
    pub token_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub otp_ttl_minutes: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a TTL is out of range.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let token_ttl_hours = matches
            .get_one::<i64>(ARG_TOKEN_TTL_HOURS)
            .copied()
            .unwrap_or(24);
        let otp_ttl_minutes = matches
            .get_one::<i64>(ARG_OTP_TTL_MINUTES)
            .copied()
            .unwrap_or(10);

        if token_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("--{ARG_TOKEN_TTL_HOURS} must be positive"));
        }
        if otp_ttl_minutes <= 0 {
            return Err(anyhow::anyhow!("--{ARG_OTP_TTL_MINUTES} must be positive"));
        }

        Ok(Self {
            token_secret: matches
                .get_one::<String>(ARG_TOKEN_SECRET)
                .cloned()
                .filter(|secret| !secret.trim().is_empty()),
            token_ttl_hours,
            otp_ttl_minutes,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Signing secret for access tokens")
                .long_help(
                    "Signing secret for access tokens. When absent a random secret is \
                     generated at startup, so issued tokens stop verifying after a restart.",
                )
                .env("SESAMO_TOKEN_SECRET"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_HOURS)
                .long(ARG_TOKEN_TTL_HOURS)
                .help("Access token lifetime in hours")
                .env("SESAMO_TOKEN_TTL_HOURS")
                .default_value("24")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_TTL_MINUTES)
                .long(ARG_OTP_TTL_MINUTES)
                .help("One-time passcode lifetime in minutes")
                .env("SESAMO_OTP_TTL_MINUTES")
                .default_value("10")
                .value_parser(clap::value_parser!(i64)),
        )
}
