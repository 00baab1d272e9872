//! Map validated CLI arguments to an executable action.

use anyhow::Result;

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if arguments are inconsistent or out of range.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>("dsn").cloned();

    let cors_origins: Vec<String> = matches
        .get_one::<String>("cors-origins")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        cors_origins,
        token_secret: auth_opts.token_secret,
        token_ttl_hours: auth_opts.token_ttl_hours,
        otp_ttl_minutes: auth_opts.otp_ttl_minutes,
        email_api_key: email_opts.api_key,
        email_sender: email_opts.sender,
        email_endpoint: email_opts.endpoint,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_server_action_with_defaults() {
        temp_env::with_vars(
            [
                ("SESAMO_PORT", None::<&str>),
                ("SESAMO_DSN", None),
                ("SESAMO_CORS_ORIGINS", None),
                ("SESAMO_TOKEN_SECRET", None),
                ("SESAMO_TOKEN_TTL_HOURS", None),
                ("SESAMO_OTP_TTL_MINUTES", None),
                ("SESAMO_EMAIL_API_KEY", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["sesamo"]);
                let Action::Server(args) = handler(&matches).expect("handler");

                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, None);
                assert_eq!(args.cors_origins, vec!["http://localhost:3000".to_string()]);
                assert_eq!(args.token_ttl_hours, 24);
                assert_eq!(args.otp_ttl_minutes, 10);
                assert_eq!(args.email_api_key, None);
            },
        );
    }

    #[test]
    fn splits_cors_origins_on_commas() {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "sesamo",
            "--cors-origins",
            "http://localhost:3000, https://app.example.com ,",
        ]);
        let Action::Server(args) = handler(&matches).expect("handler");

        assert_eq!(
            args.cors_origins,
            vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string()
            ]
        );
    }
}
