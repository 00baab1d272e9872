//! Postgres-backed store.
//!
//! One query per trait method; `consume_otp` is a single conditional UPDATE
//! so the check and the mark-used write cannot be split by a concurrent
//! request.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{InsertUserOutcome, UserStore};
use crate::auth::models::{OtpPurpose, OtpRecord, User};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Connect and bring the schema up to date.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created or migrations fail.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_verified: row.get("is_verified"),
        created_at: row.get("created_at"),
    }
}

fn otp_from_row(row: &PgRow) -> Result<OtpRecord> {
    let purpose: String = row.get("purpose");
    let purpose = OtpPurpose::parse(&purpose)
        .ok_or_else(|| anyhow!("unknown otp purpose in database: {purpose}"))?;

    Ok(OtpRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        email: row.get("email"),
        code: row.get("code"),
        purpose,
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        used: row.get("used"),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = "SELECT id, full_name, email, password_hash, is_verified, created_at \
                     FROM users WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up user by email")?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = "SELECT id, full_name, email, password_hash, is_verified, created_at \
                     FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up user by id")?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome> {
        let query = "INSERT INTO users (id, full_name, email, password_hash, is_verified, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_verified)
            .bind(user.created_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(InsertUserOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::DuplicateEmail),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let query = "UPDATE users SET is_verified = TRUE WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark user verified")?;

        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password hash")?;

        Ok(())
    }

    async fn insert_otp(&self, record: &OtpRecord) -> Result<()> {
        let query = "INSERT INTO otp_codes (id, user_id, email, code, purpose, created_at, expires_at, used) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.id)
            .bind(record.user_id)
            .bind(&record.email)
            .bind(&record.code)
            .bind(record.purpose.as_str())
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.used)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert otp record")?;

        Ok(())
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>> {
        // Single statement: the row is selected and flipped under one lock,
        // so two concurrent consumers of the same code get at most one row.
        let query = r"
            UPDATE otp_codes SET used = TRUE
            WHERE id = (
                SELECT id FROM otp_codes
                WHERE email = $1 AND code = $2 AND purpose = $3
                  AND used = FALSE AND expires_at > NOW()
                ORDER BY created_at DESC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, user_id, email, code, purpose, created_at, expires_at, used
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(code)
            .bind(purpose.as_str())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume otp record")?;

        row.map(|row| otp_from_row(&row)).transpose()
    }

    async fn invalidate_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<u64> {
        let result = match purpose {
            Some(purpose) => {
                let query = "UPDATE otp_codes SET used = TRUE \
                             WHERE email = $1 AND purpose = $2 AND used = FALSE";
                let span = info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(email)
                    .bind(purpose.as_str())
                    .execute(&self.pool)
                    .instrument(span)
                    .await
            }
            None => {
                let query = "UPDATE otp_codes SET used = TRUE \
                             WHERE email = $1 AND used = FALSE";
                let span = info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(email)
                    .execute(&self.pool)
                    .instrument(span)
                    .await
            }
        };

        let result = result.context("failed to invalidate otp records")?;
        Ok(result.rows_affected())
    }
}
