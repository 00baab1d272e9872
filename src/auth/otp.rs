//! OTP generation and lifecycle.

use anyhow::Result;
use chrono::Duration;
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;

use super::error::AuthError;
use super::models::{OtpPurpose, OtpRecord, User};
use super::store::UserStore;

/// Generate a six-digit code, uniform over `"000000"..="999999"`.
///
/// Codes come from the OS CSPRNG; a non-cryptographic generator would let an
/// attacker who observes a few codes predict the next ones.
#[must_use]
pub fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{value:06}")
}

/// Issues, invalidates, and consumes one-time passcodes.
///
/// Issuing never touches prior records; the flows decide when to sweep them.
/// Codes are not unique across users, so every lookup is scoped by email and
/// purpose, never by code alone.
pub struct OtpManager {
    store: Arc<dyn UserStore>,
    ttl: Duration,
}

impl OtpManager {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, ttl_minutes: i64) -> Self {
        Self {
            store,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    #[must_use]
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    /// Create and persist a fresh record for the user.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub async fn issue(&self, user: &User, purpose: OtpPurpose) -> Result<OtpRecord> {
        let record = OtpRecord::new(user, generate_code(), purpose, self.ttl);
        self.store.insert_otp(&record).await?;
        Ok(record)
    }

    /// Mark every unused record for the email (optionally one purpose) as
    /// used. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub async fn invalidate_all(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<()> {
        self.store.invalidate_otps(email, purpose).await?;
        Ok(())
    }

    /// Atomically consume a matching record.
    ///
    /// Wrong code and expired code produce the same error so the response
    /// cannot be used to probe which one happened.
    ///
    /// # Errors
    /// `AuthError::InvalidOrExpiredOtp` when nothing matches; `Internal` on
    /// store faults.
    pub async fn consume(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpRecord, AuthError> {
        match self.store.consume_otp(email, code, purpose).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(AuthError::InvalidOrExpiredOtp),
            Err(err) => Err(AuthError::Internal(err)),
        }
    }
}
