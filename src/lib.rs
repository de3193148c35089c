//! # vitrine: Escort Directory Service
//!
//! `vitrine` is the backend for a multi-role escort directory: escorts and
//! agencies publish profiles with photo and video portfolios, visitors browse
//! approved content and leave reviews, and administrators moderate everything
//! that goes public.
//!
//! ## Overview
//!
//! The service exposes a single REST API. Accounts register with email and
//! password and receive a JWT session token, carried either as a Bearer header
//! or in a cookie. Every account has exactly one role (`user`, `escort`,
//! `agency`, or `admin`); the role is read from the database on each gated
//! request, so role changes take effect immediately.
//!
//! User-generated content (photos, videos, documents, reviews, comments) moves
//! through a moderation state machine: `draft` → `in_review` →
//! `approved`/`rejected`. Owners submit and withdraw their own content;
//! admins decide. Only approved content is visible on public profiles.
//!
//! A credit wallet backs paid features. Credits are bought through a payment
//! provider (PayPal, or a dummy provider for testing) and spent on profile
//! tier upgrades. Every balance change is an entry in an append-only ledger.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence.
//!
//! The **API layer** ([`api`]) contains the route handlers and the
//! request/response models. The **authentication layer** ([`auth`]) issues and
//! verifies session tokens, hashes passwords, and performs role checks. The
//! **database layer** ([`db`]) uses the repository pattern: each entity has a
//! repository that owns its queries and returns typed rows. Payment providers
//! live behind the trait in [`payment_providers`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use vitrine::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = vitrine::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging)
//!     vitrine::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! // Run migrations
//! vitrine::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
pub mod moderation;
mod openapi;
pub mod payment_providers;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    auth::password,
    config::CorsOrigin,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
    payment_providers::PaymentProvider,
};
use axum::{
    Router, http,
    http::HeaderValue,
    routing::{delete, get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::{CommentId, DocumentId, OrderId, PhotoId, PostId, ReviewId, ThreadId, UserId, VideoId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from environment/files
/// - `payment_provider`: Configured payment provider, absent when purchases
///   are disabled
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payment_provider: Option<Arc<dyn PaymentProvider>>,
}

/// Get the vitrine database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// This function is idempotent: it creates the admin account on first
/// startup, and on later startups only updates the password when one is
/// configured. Returns the user ID of the created or existing admin.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> Result<UserId, anyhow::Error> {
    let password_hash = password
        .map(|p| password::hash_password(p, &crate::config::PasswordConfig::default()))
        .transpose()
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
                .bind(password_hash)
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        email: email.to_string(),
        display_name: None,
        role: crate::api::models::users::Role::Admin,
        slug: None,
        password_hash,
        // The bootstrap admin never goes through the verification flow
        email_verified_at: Some(chrono::Utc::now()),
    };

    let created_user = user_repo.create(&user_create).await?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Authentication routes (register, login, logout, email verification)
/// - The versioned API under `/api/v1` (profiles, media, reviews, wallet,
///   forum, admin)
/// - The payment webhook at `/webhooks/payments`
/// - API documentation at `/docs`
/// - Tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    // Authentication routes at root level, outside the versioned API
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route(
            "/authentication/email-verifications",
            post(api::handlers::auth::request_email_verification),
        )
        .route(
            "/authentication/email-verifications/confirm",
            post(api::handlers::auth::confirm_email_verification),
        );

    let api_routes = Router::new()
        // Current account
        .route(
            "/users/current",
            get(api::handlers::users::get_current_user).patch(api::handlers::users::update_current_user),
        )
        // Own profile and public profile reads
        .route(
            "/profile",
            get(api::handlers::profiles::get_own_profile).patch(api::handlers::profiles::patch_own_profile),
        )
        .route("/profile/tier-upgrade", post(api::handlers::profiles::upgrade_tier))
        .route("/profiles/{slug}", get(api::handlers::profiles::get_public_profile))
        // Photos: no deletion route, uploaded photos are permanent
        .route(
            "/photos",
            get(api::handlers::photos::list_photos).post(api::handlers::photos::create_photo),
        )
        .route("/photos/submissions", post(api::handlers::photos::submit_portfolio))
        .route("/photos/{id}/submit", post(api::handlers::photos::submit_photo))
        .route("/photos/{id}/withdraw", post(api::handlers::photos::withdraw_photo))
        // Videos
        .route(
            "/videos",
            get(api::handlers::videos::list_videos).post(api::handlers::videos::create_video),
        )
        .route("/videos/{id}", delete(api::handlers::videos::delete_video))
        .route("/videos/{id}/submit", post(api::handlers::videos::submit_video))
        .route("/videos/{id}/withdraw", post(api::handlers::videos::withdraw_video))
        // Verification documents
        .route(
            "/documents",
            get(api::handlers::documents::list_documents).post(api::handlers::documents::create_document),
        )
        .route("/documents/{id}", delete(api::handlers::documents::delete_document))
        // Reviews and comments on profiles
        .route(
            "/users/{id}/reviews",
            get(api::handlers::reviews::list_reviews).post(api::handlers::reviews::create_review),
        )
        .route(
            "/users/{id}/comments",
            get(api::handlers::comments::list_comments).post(api::handlers::comments::create_comment),
        )
        // Wallet
        .route("/wallet", get(api::handlers::wallets::get_wallet))
        .route("/wallet/transactions", get(api::handlers::wallets::list_transactions))
        .route("/wallet/orders", get(api::handlers::wallets::list_orders))
        .route("/wallet/purchases", post(api::handlers::wallets::create_purchase))
        .route(
            "/wallet/purchases/{order_id}/capture",
            post(api::handlers::wallets::capture_purchase),
        )
        // Forum
        .route(
            "/forum/threads",
            get(api::handlers::forum::list_threads).post(api::handlers::forum::create_thread),
        )
        .route("/forum/threads/{id}", get(api::handlers::forum::get_thread))
        .route(
            "/forum/threads/{id}/posts",
            get(api::handlers::forum::list_posts).post(api::handlers::forum::create_post),
        )
        // Admin surface
        .route("/admin/moderation/{kind}", get(api::handlers::admin::moderation_queue))
        .route("/admin/users/roles", post(api::handlers::admin::bulk_update_roles))
        .route("/admin/{kind}/{id}/status", patch(api::handlers::admin::decide_status));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (external services, not part of client API docs)
        .route("/webhooks/payments", post(api::handlers::payments::payment_webhook))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"));

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, creates the initial admin user, and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: When the shutdown signal completes, in-flight requests
///    finish and connections are closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting vitrine with configuration: {:#?}", config);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.pool.max_connections)
            .min_connections(config.database.pool.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.database.pool.acquire_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.database.pool.idle_timeout_secs))
            .max_lifetime(std::time::Duration::from_secs(config.database.pool.max_lifetime_secs))
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;

        let payment_provider = config.payment.clone().map(payment_providers::create_provider);
        if payment_provider.is_none() {
            info!("No payment provider configured; credit purchases are disabled");
        }

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_payment_provider(payment_provider)
            .build();

        let router = build_router(state).layer(create_cors_layer(&config)?);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("vitrine listening on http://{}", bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::{api::models::users::Role, db::handlers::Users};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin@example.com", Some("bootstrap-password"), &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin@example.com", None, &pool).await.unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn)
            .get_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.password_hash.is_some());
        assert!(admin.email_verified_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let server = crate::test_utils::create_test_app(pool).await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_method_on_known_path(pool: PgPool) {
        let server = crate::test_utils::create_test_app(pool).await;
        // /api/v1/wallet only has a GET route
        let response = server.post("/api/v1/wallet").await;
        response.assert_status(axum::http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_docs_served(pool: PgPool) {
        let server = crate::test_utils::create_test_app(pool).await;
        server.get("/docs").await.assert_status_ok();
        server.get("/api-docs/openapi.json").await.assert_status_ok();
    }
}
