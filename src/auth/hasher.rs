//! Password hashing with Argon2id.

use anyhow::Result;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

/// One-way credential hashing and verification.
///
/// Every hash gets a fresh random salt, so two hashes of the same password
/// never compare equal.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialHasher;

impl CredentialHasher {
    fn argon2() -> Result<Argon2<'static>> {
        // 19 MiB, 2 iterations, 1 lane
        let params = Params::new(19_456, 2, 1, None)
            .map_err(|e| anyhow::anyhow!("Failed to create Argon2 params: {e}"))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password into a PHC-formatted string.
    ///
    /// # Errors
    /// Returns an error if the hashing backend fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Self::argon2()?;

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?
            .to_string();

        Ok(hash)
    }

    /// Check a password against a stored hash.
    ///
    /// A malformed hash verifies as `false` rather than erroring; callers must
    /// not be able to tell a corrupt record from a wrong password.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let Ok(argon2) = Self::argon2() else {
            return false;
        };

        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }
}
