//! Data model for users and one-time passcodes.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Purpose tag attached to every OTP record.
///
/// Consumption is always scoped by email **and** purpose, so a reset code can
/// never be replayed against the verification flow (or vice versa), even if
/// two codes happen to collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    Verification,
    Reset,
}

impl OtpPurpose {
    /// Stable string form used for persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Reset => "reset",
        }
    }

    /// Parse the persisted form back into the enum.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "verification" => Some(Self::Verification),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    /// Human-readable phrase used in outbound email copy.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Verification => "email verification",
            Self::Reset => "password reset",
        }
    }
}

/// A registered account.
///
/// `email` is stored exactly as supplied (after trimming); uniqueness is
/// case-sensitive. `is_verified` starts false and only ever moves to true.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(full_name: &str, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash,
            is_verified: false,
            created_at: Utc::now(),
        }
    }
}

/// A single one-time passcode.
///
/// Records are never deleted; invalidation flips `used` to true. A record is
/// consumable iff it is unused, unexpired, and matches email, code, and
/// purpose.
#[derive(Clone, Debug)]
pub struct OtpRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Copy of the owning user's email at issuance time.
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl OtpRecord {
    #[must_use]
    pub fn new(user: &User, code: String, purpose: OtpPurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            email: user.email.clone(),
            code,
            purpose,
            created_at: now,
            expires_at: now + ttl,
            used: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_round_trips_through_persisted_form() {
        for purpose in [OtpPurpose::Verification, OtpPurpose::Reset] {
            assert_eq!(OtpPurpose::parse(purpose.as_str()), Some(purpose));
        }
        assert_eq!(OtpPurpose::parse("login"), None);
    }

    #[test]
    fn new_user_starts_unverified() {
        let user = User::new("Alice", "a@x.com", "$argon2id$stub".to_string());
        assert!(!user.is_verified);
        assert_eq!(user.email, "a@x.com");
        assert!(user.created_at <= Utc::now());
    }

    #[test]
    fn new_record_expires_after_ttl() {
        let user = User::new("Alice", "a@x.com", "$argon2id$stub".to_string());
        let record = OtpRecord::new(
            &user,
            "123456".to_string(),
            OtpPurpose::Reset,
            Duration::minutes(10),
        );
        assert!(!record.used);
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.email, user.email);
        assert_eq!(record.expires_at - record.created_at, Duration::minutes(10));
    }
}
