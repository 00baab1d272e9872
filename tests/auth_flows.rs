//! End-to-end flow tests over the in-memory store.
//!
//! Outbound email is captured through a channel-backed sender, so the tests
//! can read the codes a real deployment would have delivered.

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::Extension;
use axum::response::{IntoResponse, Json};
use regex::Regex;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use sesamo::api::handlers::auth::password::forgot_password;
use sesamo::api::handlers::auth::types::ForgotPasswordRequest;
use sesamo::auth::{
    AuthConfig, AuthError, AuthService, MemoryUserStore, NoopRateLimiter, RateLimiter,
    SlidingWindowRateLimiter, TokenService, UserStore,
};
use sesamo::email::{EmailMessage, EmailSender};

const SECRET: &str = "integration-secret";

/// Forwards every message into a channel so tests can observe dispatched
/// email without a provider.
struct ChannelEmailSender {
    tx: mpsc::UnboundedSender<EmailMessage>,
}

#[async_trait]
impl EmailSender for ChannelEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let _ = self.tx.send(message.clone());
        Ok(())
    }
}

struct Harness {
    service: Arc<AuthService>,
    store: Arc<MemoryUserStore>,
    inbox: mpsc::UnboundedReceiver<EmailMessage>,
}

fn harness_with_limiter(rate_limiter: Arc<dyn RateLimiter>) -> Harness {
    let store = Arc::new(MemoryUserStore::new());
    let (tx, inbox) = mpsc::unbounded_channel();
    let config = AuthConfig::new();

    let service = Arc::new(AuthService::new(
        store.clone(),
        TokenService::new(SecretString::from(SECRET), 24),
        rate_limiter,
        Arc::new(ChannelEmailSender { tx }),
        &config,
    ));

    Harness {
        service,
        store,
        inbox,
    }
}

fn harness() -> Harness {
    harness_with_limiter(Arc::new(NoopRateLimiter))
}

/// Wait for the next dispatched email and pull the six-digit code out of it.
async fn next_code(inbox: &mut mpsc::UnboundedReceiver<EmailMessage>) -> String {
    let message = tokio::time::timeout(Duration::from_secs(5), inbox.recv())
        .await
        .expect("timed out waiting for dispatched email")
        .expect("email channel closed");

    Regex::new(r"\d{6}")
        .expect("regex")
        .find(&message.html)
        .expect("no code in email body")
        .as_str()
        .to_string()
}

#[tokio::test]
async fn register_verify_login_reset_end_to_end() {
    let mut h = harness();

    // Register: success, no token yet.
    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let verify_code = next_code(&mut h.inbox).await;

    // Wrong code is rejected with the generic error.
    let wrong_code = if verify_code == "000000" { "000001" } else { "000000" };
    assert!(matches!(
        h.service.verify_otp("a@x.com", wrong_code).await,
        Err(AuthError::InvalidOrExpiredOtp)
    ));

    // Correct code verifies the account.
    h.service
        .verify_otp("a@x.com", &verify_code)
        .await
        .expect("verify");

    // Login now succeeds; the token round-trips subject and email.
    let grant = h
        .service
        .login("a@x.com", "secret1", false)
        .await
        .expect("login");
    assert!(grant.user.is_verified);

    let tokens = TokenService::new(SecretString::from(SECRET), 24);
    let claims = tokens.verify(&grant.token).expect("token verifies");
    assert_eq!(claims.sub, grant.user.id.to_string());
    assert_eq!(claims.email, "a@x.com");

    // Reset the password via the reset-purpose code.
    h.service
        .forgot_password("a@x.com")
        .await
        .expect("forgot password");
    let reset_code = next_code(&mut h.inbox).await;
    h.service
        .reset_password("a@x.com", &reset_code, "secret2")
        .await
        .expect("reset password");

    // Old password is dead, new one works.
    assert!(matches!(
        h.service.login("a@x.com", "secret1", false).await,
        Err(AuthError::InvalidCredentials)
    ));
    h.service
        .login("a@x.com", "secret2", false)
        .await
        .expect("login with new password");
}

#[tokio::test]
async fn second_register_with_same_email_is_rejected() {
    let h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");

    for password in ["secret1", "completely-different"] {
        assert!(matches!(
            h.service.register("Mallory", "a@x.com", password).await,
            Err(AuthError::EmailTaken)
        ));
    }
}

#[tokio::test]
async fn verification_code_is_single_use() {
    let mut h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let code = next_code(&mut h.inbox).await;

    h.service
        .verify_otp("a@x.com", &code)
        .await
        .expect("first consume");

    // The verified flag flipped exactly once; a replay fails.
    let user = h
        .store
        .find_user_by_email("a@x.com")
        .await
        .expect("store")
        .expect("user");
    assert!(user.is_verified);

    assert!(matches!(
        h.service.verify_otp("a@x.com", &code).await,
        Err(AuthError::InvalidOrExpiredOtp)
    ));
}

#[tokio::test]
async fn login_is_locked_until_verification() {
    let mut h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");

    // Correct credentials, unverified account.
    assert!(matches!(
        h.service.login("a@x.com", "secret1", false).await,
        Err(AuthError::EmailNotVerified)
    ));

    let code = next_code(&mut h.inbox).await;
    h.service.verify_otp("a@x.com", &code).await.expect("verify");

    h.service
        .login("a@x.com", "secret1", false)
        .await
        .expect("login after verification");
}

#[tokio::test]
async fn resend_invalidates_previous_verification_codes() {
    let mut h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let first = next_code(&mut h.inbox).await;

    h.service.resend_otp("a@x.com").await.expect("resend");
    let second = next_code(&mut h.inbox).await;

    if first != second {
        assert!(matches!(
            h.service.verify_otp("a@x.com", &first).await,
            Err(AuthError::InvalidOrExpiredOtp)
        ));
    }
    h.service
        .verify_otp("a@x.com", &second)
        .await
        .expect("fresh code verifies");
}

#[tokio::test]
async fn resend_for_unknown_email_says_user_not_found() {
    let h = harness();
    assert!(matches!(
        h.service.resend_otp("ghost@x.com").await,
        Err(AuthError::UserNotFound)
    ));
}

#[tokio::test]
async fn reset_code_cannot_be_used_for_verification() {
    let mut h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let _verify_code = next_code(&mut h.inbox).await;

    h.service.forgot_password("a@x.com").await.expect("forgot");
    let reset_code = next_code(&mut h.inbox).await;

    assert!(matches!(
        h.service.verify_otp("a@x.com", &reset_code).await,
        Err(AuthError::InvalidOrExpiredOtp)
    ));
}

#[tokio::test]
async fn forgot_password_responses_are_byte_identical() {
    let mut h = harness();

    h.service
        .register("Alice", "present@x.com", "secret1")
        .await
        .expect("register");
    let _ = next_code(&mut h.inbox).await;

    let mut bodies = Vec::new();
    for email in ["present@x.com", "absent@x.com"] {
        let response = forgot_password(
            Extension(Arc::clone(&h.service)),
            Some(Json(ForgotPasswordRequest {
                email: email.to_string(),
            })),
        )
        .await
        .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn whoami_fails_for_deleted_accounts() {
    let mut h = harness();

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let code = next_code(&mut h.inbox).await;
    h.service.verify_otp("a@x.com", &code).await.expect("verify");

    let grant = h
        .service
        .login("a@x.com", "secret1", false)
        .await
        .expect("login");

    let user = h.service.whoami(&grant.token).await.expect("whoami");
    assert_eq!(user.email, "a@x.com");

    // Tokens are stateless; the user lookup is the only staleness guard.
    assert!(h.store.remove_user(user.id).await);
    assert!(matches!(
        h.service.whoami(&grant.token).await,
        Err(AuthError::UserNotFound)
    ));
}

#[tokio::test]
async fn resend_is_rate_limited_per_email() {
    let mut h = harness_with_limiter(Arc::new(SlidingWindowRateLimiter::new(
        sesamo::auth::RateLimitConfig::default(),
    )));

    h.service
        .register("Alice", "a@x.com", "secret1")
        .await
        .expect("register");
    let _ = next_code(&mut h.inbox).await;

    // Three resends within the window are admitted, the fourth is not.
    for _ in 0..3 {
        h.service.resend_otp("a@x.com").await.expect("resend");
        let _ = next_code(&mut h.inbox).await;
    }
    assert!(matches!(
        h.service.resend_otp("a@x.com").await,
        Err(AuthError::RateLimited)
    ));

    // Another email is unaffected.
    h.service
        .register("Bob", "b@x.com", "secret1")
        .await
        .expect("register bob");
    let _ = next_code(&mut h.inbox).await;
    h.service.resend_otp("b@x.com").await.expect("resend bob");
}
