//! In-memory store for local development and tests.
//!
//! Selected automatically when no database DSN is configured. Nothing
//! persists across restarts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{InsertUserOutcome, UserStore};
use crate::auth::models::{OtpPurpose, OtpRecord, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    otps: Vec<OtpRecord>,
}

/// All tables live behind one mutex, which trivially gives `consume_otp` its
/// required check-and-set atomicity.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: Mutex<Tables>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user record. Account deletion is not part of the public API;
    /// this exists so the stale-token guard on `/me` can be exercised.
    pub async fn remove_user(&self, id: Uuid) -> bool {
        self.tables.lock().await.users.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Ok(InsertUserOutcome::DuplicateEmail);
        }
        tables.users.insert(user.id, user.clone());
        Ok(InsertUserOutcome::Created)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.get_mut(&id) {
            user.is_verified = true;
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn insert_otp(&self, record: &OtpRecord) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.otps.push(record.clone());
        Ok(())
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>> {
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let record = tables.otps.iter_mut().rev().find(|record| {
            !record.used
                && record.email == email
                && record.code == code
                && record.purpose == purpose
                && now < record.expires_at
        });

        Ok(record.map(|record| {
            record.used = true;
            record.clone()
        }))
    }

    async fn invalidate_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut flipped = 0;
        for record in tables
            .otps
            .iter_mut()
            .filter(|record| !record.used && record.email == email)
            .filter(|record| purpose.is_none_or(|p| record.purpose == p))
        {
            record.used = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn user(email: &str) -> User {
        User::new("Alice", email, "$argon2id$stub".to_string())
    }

    fn otp(user: &User, code: &str, purpose: OtpPurpose) -> OtpRecord {
        OtpRecord::new(user, code.to_string(), purpose, Duration::minutes(10))
    }

    #[tokio::test]
    async fn duplicate_email_is_an_outcome() {
        let store = MemoryUserStore::new();
        let first = user("a@x.com");
        let second = user("a@x.com");

        assert_eq!(
            store.insert_user(&first).await.unwrap(),
            InsertUserOutcome::Created
        );
        assert_eq!(
            store.insert_user(&second).await.unwrap(),
            InsertUserOutcome::DuplicateEmail
        );
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert_user(&user("Alice@x.com")).await.unwrap();

        assert!(store
            .find_user_by_email("Alice@x.com")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_user_by_email("alice@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn consume_marks_used_and_refuses_replay() {
        let store = MemoryUserStore::new();
        let owner = user("a@x.com");
        store.insert_user(&owner).await.unwrap();
        store
            .insert_otp(&otp(&owner, "123456", OtpPurpose::Verification))
            .await
            .unwrap();

        let consumed = store
            .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
            .await
            .unwrap();
        assert!(consumed.is_some_and(|record| record.used));

        let replay = store
            .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
            .await
            .unwrap();
        assert!(replay.is_none());
    }

    #[tokio::test]
    async fn consume_is_scoped_by_purpose() {
        let store = MemoryUserStore::new();
        let owner = user("a@x.com");
        store.insert_user(&owner).await.unwrap();
        store
            .insert_otp(&otp(&owner, "123456", OtpPurpose::Reset))
            .await
            .unwrap();

        let wrong_purpose = store
            .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
            .await
            .unwrap();
        assert!(wrong_purpose.is_none());
    }

    #[tokio::test]
    async fn expired_records_are_not_consumable() {
        let store = MemoryUserStore::new();
        let owner = user("a@x.com");
        store.insert_user(&owner).await.unwrap();

        let mut stale = otp(&owner, "123456", OtpPurpose::Verification);
        stale.expires_at = Utc::now() - Duration::seconds(1);
        store.insert_otp(&stale).await.unwrap();

        let consumed = store
            .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
            .await
            .unwrap();
        assert!(consumed.is_none());
    }

    #[tokio::test]
    async fn concurrent_consumers_get_at_most_one_success() {
        let store = Arc::new(MemoryUserStore::new());
        let owner = user("a@x.com");
        store.insert_user(&owner).await.unwrap();
        store
            .insert_otp(&otp(&owner, "123456", OtpPurpose::Verification))
            .await
            .unwrap();

        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
                    .await
            })
        };
        let second = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .consume_otp("a@x.com", "123456", OtpPurpose::Verification)
                    .await
            })
        };

        let (first, second) = tokio::join!(first, second);
        let successes = [first.unwrap().unwrap(), second.unwrap().unwrap()]
            .into_iter()
            .flatten()
            .count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn invalidate_filters_by_purpose_and_is_idempotent() {
        let store = MemoryUserStore::new();
        let owner = user("a@x.com");
        store.insert_user(&owner).await.unwrap();
        store
            .insert_otp(&otp(&owner, "111111", OtpPurpose::Verification))
            .await
            .unwrap();
        store
            .insert_otp(&otp(&owner, "222222", OtpPurpose::Reset))
            .await
            .unwrap();

        let flipped = store
            .invalidate_otps("a@x.com", Some(OtpPurpose::Reset))
            .await
            .unwrap();
        assert_eq!(flipped, 1);

        // The verification code survives a reset-scoped sweep.
        assert!(store
            .consume_otp("a@x.com", "111111", OtpPurpose::Verification)
            .await
            .unwrap()
            .is_some());

        let again = store
            .invalidate_otps("a@x.com", Some(OtpPurpose::Reset))
            .await
            .unwrap();
        assert_eq!(again, 0);
    }
}
