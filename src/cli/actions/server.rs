//! Server action: assemble configuration and run the API.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

use crate::api;
use crate::auth::AuthConfig;
use crate::email::{EmailSender, HttpApiEmailSender, LogEmailSender};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub cors_origins: Vec<String>,
    pub token_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub otp_ttl_minutes: i64,
    pub email_api_key: Option<String>,
    pub email_sender: String,
    pub email_endpoint: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the email client or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut auth_config = AuthConfig::new()
        .with_token_ttl_hours(args.token_ttl_hours)
        .with_otp_ttl_minutes(args.otp_ttl_minutes);

    if let Some(secret) = args.token_secret {
        auth_config = auth_config.with_token_secret(SecretString::from(secret));
    }

    let mailer: Arc<dyn EmailSender> = match args.email_api_key {
        Some(api_key) => Arc::new(HttpApiEmailSender::new(
            args.email_endpoint,
            SecretString::from(api_key),
            args.email_sender,
        )?),
        None => {
            info!("No email provider API key configured; outbound email will be logged only");
            Arc::new(LogEmailSender)
        }
    };

    api::new(args.port, args.dsn, &args.cors_origins, auth_config, mailer).await
}
