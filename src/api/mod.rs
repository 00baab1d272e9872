//! HTTP surface: router assembly and server startup.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;

use crate::auth::{
    AuthConfig, AuthService, MemoryUserStore, PgUserStore, SlidingWindowRateLimiter, TokenService,
    UserStore,
};
use crate::email::EmailSender;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Start the server.
///
/// Without a DSN the in-memory store is used; without a configured signing
/// secret a fresh one is generated for this process only. Both fallbacks are
/// loudly logged since neither survives a restart.
///
/// # Errors
/// Returns an error if the database, CORS configuration, or listener setup
/// fails.
pub async fn new(
    port: u16,
    dsn: Option<String>,
    cors_origins: &[String],
    auth_config: AuthConfig,
    mailer: Arc<dyn EmailSender>,
) -> Result<()> {
    let store: Arc<dyn UserStore> = match dsn {
        Some(dsn) => Arc::new(PgUserStore::connect(&dsn).await?),
        None => {
            warn!("No database DSN configured; using the in-memory store (state is lost on restart)");
            Arc::new(MemoryUserStore::new())
        }
    };

    let secret = match auth_config.token_secret() {
        Some(secret) => secret.clone(),
        None => {
            warn!("No signing secret configured; generated one for this process (tokens will not survive a restart)");
            TokenService::generate_secret()?
        }
    };
    let tokens = TokenService::new(secret, auth_config.token_ttl_hours());
    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(auth_config.rate_limits()));
    let service = Arc::new(AuthService::new(
        store,
        tokens,
        rate_limiter,
        mailer,
        &auth_config,
    ));

    let app = router(service, cors_origins)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Assemble the router with tracing, request ids, and CORS.
///
/// # Errors
/// Returns an error if a configured CORS origin is not a valid URL.
pub fn router(service: Arc<AuthService>, cors_origins: &[String]) -> Result<Router> {
    let cors = cors_layer(cors_origins)?;

    let app = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi()) }))
        .route(
            "/api/auth/register",
            post(handlers::auth::register::register),
        )
        .route(
            "/api/auth/verify-otp",
            post(handlers::auth::verify::verify_otp),
        )
        .route(
            "/api/auth/resend-otp",
            post(handlers::auth::verify::resend_otp),
        )
        .route("/api/auth/login", post(handlers::auth::login::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::password::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::password::reset_password),
        )
        .route("/api/auth/me", get(handlers::auth::me::me))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(service)),
        );

    Ok(app)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let mut values = Vec::with_capacity(origins.len());
    for origin in origins {
        values.push(allowed_origin(origin)?);
    }

    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::list(values))
        .allow_credentials(true))
}

/// Normalize a configured origin down to `scheme://host[:port]`.
fn allowed_origin(origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(origin).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("CORS origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let normalized = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&normalized).context("Failed to build CORS origin header")
}
