//! Signed, time-bound bearer tokens carrying user identity.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

/// Claim set embedded in every access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens.
///
/// The signing secret lives for the process lifetime; there is no rotation
/// and no revocation list. Verification is all-or-nothing: a token is either
/// fully trusted (signature and expiry both good) or rejected.
pub struct TokenService {
    secret: SecretString,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString, ttl_hours: i64) -> Self {
        Self {
            secret,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Create a fresh random signing secret (32 bytes, base64url).
    ///
    /// Tokens signed with a generated secret do not survive a restart unless
    /// the secret is persisted externally.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn generate_secret() -> Result<SecretString> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate signing secret")?;
        Ok(SecretString::from(Base64UrlUnpadded::encode_string(&bytes)))
    }

    /// Issue a token for the given subject, expiring after the service TTL.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .context("failed to sign access token")
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidToken` for malformed, tampered, or expired
    /// tokens; the cause is not distinguished.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}
