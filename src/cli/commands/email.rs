//! Outbound email arguments.

use clap::{Arg, ArgMatches, Command};

use crate::email::DEFAULT_API_ENDPOINT;

pub const ARG_EMAIL_API_KEY: &str = "email-api-key";
pub const ARG_EMAIL_SENDER: &str = "email-sender";
pub const ARG_EMAIL_ENDPOINT: &str = "email-endpoint";

#[derive(Debug, Clone)]
pub struct Options {
    pub api_key: Option<String>,
    pub sender: String,
    pub endpoint: String,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            api_key: matches
                .get_one::<String>(ARG_EMAIL_API_KEY)
                .cloned()
                .filter(|key| !key.trim().is_empty()),
            sender: matches
                .get_one::<String>(ARG_EMAIL_SENDER)
                .cloned()
                .unwrap_or_else(|| "noreply@example.com".to_string()),
            endpoint: matches
                .get_one::<String>(ARG_EMAIL_ENDPOINT)
                .cloned()
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("Email provider API key")
                .long_help(
                    "Email provider API key. When absent outbound email is simulated: \
                     messages are logged instead of delivered.",
                )
                .env("SESAMO_EMAIL_API_KEY"),
        )
        .arg(
            Arg::new(ARG_EMAIL_SENDER)
                .long(ARG_EMAIL_SENDER)
                .help("Sender address for outbound email")
                .env("SESAMO_EMAIL_SENDER")
                .default_value("noreply@example.com"),
        )
        .arg(
            Arg::new(ARG_EMAIL_ENDPOINT)
                .long(ARG_EMAIL_ENDPOINT)
                .help("Email provider HTTP endpoint")
                .env("SESAMO_EMAIL_ENDPOINT")
                .default_value(DEFAULT_API_ENDPOINT),
        )
}
