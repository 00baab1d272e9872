//! Persistence boundary for users and OTP records.
//!
//! The trait exposes one typed method per access pattern instead of a generic
//! filter/query object, which keeps the store swappable and the call sites
//! honest about what they read and write.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::models::{OtpPurpose, OtpRecord, User};

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Outcome of inserting a new user. A duplicate email is a domain outcome,
/// not an infrastructure error, so creation races surface cleanly.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertUserOutcome {
    Created,
    DuplicateEmail,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome>;

    /// Flip the verified flag to true. Monotonic; never reverts.
    async fn mark_verified(&self, id: Uuid) -> Result<()>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn insert_otp(&self, record: &OtpRecord) -> Result<()>;

    /// Atomically consume the matching unused, unexpired record.
    ///
    /// The check and the `used = true` write must be one operation; two
    /// concurrent consumers of the same code get at most one `Some`.
    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>>;

    /// Mark every unused record for the email (optionally one purpose) as
    /// used. Idempotent; returns how many records were flipped.
    async fn invalidate_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<u64>;
}
