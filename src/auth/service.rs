//! The authentication flows.
//!
//! `AuthService` is the single entry point for every command the HTTP layer
//! can produce. Each flow runs to one terminal outcome: success or exactly
//! one [`AuthError`] variant. Collaborators are injected (store, rate
//! limiter, email sender) so the flows can be exercised without a database
//! or a mail provider.

use regex::Regex;
use std::sync::Arc;

use super::config::AuthConfig;
use super::error::AuthError;
use super::hasher::CredentialHasher;
use super::models::{OtpPurpose, User};
use super::otp::OtpManager;
use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimiter};
use super::store::{InsertUserOutcome, UserStore};
use super::token::{Claims, TokenService};
use crate::email::{self, EmailSender};

const FULL_NAME_MIN: usize = 2;
const FULL_NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;

/// Successful login: the bearer token plus the authenticated user.
pub struct LoginGrant {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    tokens: TokenService,
    otp: OtpManager,
    rate_limiter: Arc<dyn RateLimiter>,
    mailer: Arc<dyn EmailSender>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenService,
        rate_limiter: Arc<dyn RateLimiter>,
        mailer: Arc<dyn EmailSender>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            otp: OtpManager::new(Arc::clone(&store), config.otp_ttl_minutes()),
            store,
            hasher: CredentialHasher,
            tokens,
            rate_limiter,
            mailer,
        }
    }

    /// Create an unverified account and email a verification code.
    ///
    /// No token is returned; login stays locked until the code is consumed.
    ///
    /// # Errors
    /// `Validation`, `EmailTaken`, `RateLimited`, or `Internal`.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let full_name = full_name.trim();
        let email = email.trim();
        validate_full_name(full_name)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        if self.check_limit(email, RateLimitAction::Register) {
            return Err(AuthError::RateLimited);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = User::new(full_name, email, password_hash);
        if let InsertUserOutcome::DuplicateEmail = self.store.insert_user(&user).await? {
            // Lost a creation race; indistinguishable from the pre-check hit.
            return Err(AuthError::EmailTaken);
        }

        // If this write fails the account exists without a code; resend-otp
        // recovers that state, so no rollback is attempted.
        let record = self.otp.issue(&user, OtpPurpose::Verification).await?;
        self.send_otp_email(&user.email, &record.code, OtpPurpose::Verification);

        Ok(())
    }

    /// Consume a verification code and unlock login for the account.
    ///
    /// # Errors
    /// `Validation`, `InvalidOrExpiredOtp`, or `Internal`.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = email.trim();
        validate_email(email)?;

        let record = self
            .otp
            .consume(email, code.trim(), OtpPurpose::Verification)
            .await?;
        self.store.mark_verified(record.user_id).await?;

        Ok(())
    }

    /// Invalidate outstanding verification codes and email a fresh one.
    ///
    /// # Errors
    /// `Validation`, `RateLimited`, `UserNotFound`, or `Internal`.
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        validate_email(email)?;

        if self.check_limit(email, RateLimitAction::ResendOtp) {
            return Err(AuthError::RateLimited);
        }

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.otp
            .invalidate_all(&user.email, Some(OtpPurpose::Verification))
            .await?;
        let record = self.otp.issue(&user, OtpPurpose::Verification).await?;
        self.send_otp_email(&user.email, &record.code, OtpPurpose::Verification);

        Ok(())
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Unknown email and wrong password collapse into `InvalidCredentials`;
    /// only a correct password on an unverified account reveals more
    /// (`EmailNotVerified`), matching the registration flow the caller
    /// already completed.
    ///
    /// `_remember_me` is accepted for API compatibility but does not
    /// currently change the token lifetime.
    ///
    /// # Errors
    /// `Validation`, `InvalidCredentials`, `EmailNotVerified`, or `Internal`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        _remember_me: bool,
    ) -> Result<LoginGrant, AuthError> {
        let email = email.trim();
        validate_email(email)?;

        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        Ok(LoginGrant { token, user })
    }

    /// Start the password-reset flow.
    ///
    /// Succeeds whether or not the email is registered; only the registered
    /// branch issues a code. Callers must surface one identical message for
    /// both branches.
    ///
    /// # Errors
    /// `Validation`, `RateLimited`, or `Internal`.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        validate_email(email)?;

        if self.check_limit(email, RateLimitAction::ForgotPassword) {
            return Err(AuthError::RateLimited);
        }

        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Ok(());
        };

        self.otp
            .invalidate_all(&user.email, Some(OtpPurpose::Reset))
            .await?;
        let record = self.otp.issue(&user, OtpPurpose::Reset).await?;
        self.send_otp_email(&user.email, &record.code, OtpPurpose::Reset);

        Ok(())
    }

    /// Consume a reset code and overwrite the password hash.
    ///
    /// Does not log the user in; they authenticate with the new password.
    ///
    /// # Errors
    /// `Validation`, `InvalidOrExpiredOtp`, or `Internal`.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(new_password)?;

        let record = self.otp.consume(email, code.trim(), OtpPurpose::Reset).await?;

        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .update_password_hash(record.user_id, &password_hash)
            .await?;

        Ok(())
    }

    /// Resolve a bearer token into its user.
    ///
    /// Tokens are stateless, so this lookup is the only staleness guard: a
    /// token for a deleted account fails with `UserNotFound`.
    ///
    /// # Errors
    /// `InvalidToken`, `UserNotFound`, or `Internal`.
    pub async fn whoami(&self, token: &str) -> Result<User, AuthError> {
        let claims: Claims = self.tokens.verify(token)?;
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn check_limit(&self, email: &str, action: RateLimitAction) -> bool {
        self.rate_limiter.check(email, action) == RateLimitDecision::Limited
    }

    fn send_otp_email(&self, to: &str, code: &str, purpose: OtpPurpose) {
        let message = email::otp_message(to, code, purpose.describe(), self.otp.ttl_minutes());
        email::dispatch(Arc::clone(&self.mailer), message);
    }
}

fn validate_full_name(full_name: &str) -> Result<(), AuthError> {
    let length = full_name.chars().count();
    if (FULL_NAME_MIN..=FULL_NAME_MAX).contains(&length) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "Full name must be between {FULL_NAME_MIN} and {FULL_NAME_MAX} characters"
        )))
    }
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email));
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid email address".to_string()))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() >= PASSWORD_MIN {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "Password must be at least {PASSWORD_MIN} characters"
        )))
    }
}
