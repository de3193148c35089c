//! Test utilities for integration testing (available with `test-utils` feature).

use crate::{
    api::models::users::Role,
    db::{
        handlers::{Repository, Users, Wallets},
        models::{
            users::{UserCreateDBRequest, UserDBResponse},
            wallets::{TransactionCreateDBRequest, TransactionKind},
        },
    },
    types::UserId,
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> crate::config::Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("vitrine-test-emails-{}", std::process::id()));

    let mut config = crate::config::Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.site_url = "http://localhost:5173".to_string();
    config.admin_email = "admin@test.com".to_string();
    config.secret_key = Some("test-secret-key-for-testing-only".to_string());
    config.payment = Some(crate::config::PaymentConfig::Dummy(crate::config::DummyConfig::default()));
    config.email.transport = crate::config::EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    // Ultra-weak params for fast testing (DO NOT USE IN PRODUCTION)
    config.auth.native.password.argon2_memory_kib = 128;
    config.auth.native.password.argon2_iterations = 1;
    config.auth.native.password.argon2_parallelism = 1;
    config
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: crate::config::Config) -> TestServer {
    // Mirror main(): reqwest clients need a process-wide rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let payment_provider = config.payment.clone().map(crate::payment_providers::create_provider);

    let state = crate::AppState::builder()
        .db(pool)
        .config(config)
        .maybe_payment_provider(payment_provider)
        .build();

    TestServer::new(crate::build_router(state)).expect("Failed to create test server")
}

/// Test server whose requests carry the user's session token by default.
pub async fn create_test_app_with_user(pool: PgPool, user: &UserDBResponse) -> TestServer {
    create_test_app_with_config_and_user(pool, create_test_config(), user).await
}

pub async fn create_test_app_with_config_and_user(
    pool: PgPool,
    config: crate::config::Config,
    user: &UserDBResponse,
) -> TestServer {
    let token =
        crate::auth::session::create_session_token(user.id, &user.email, &config).expect("Failed to create session token");

    let mut server = create_test_app_with_config(pool, config).await;
    server.add_header("authorization", format!("Bearer {token}"));
    server
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let user_id = Uuid::new_v4();
    let email = format!("testuser_{}@example.com", user_id.simple());

    let user_create = UserCreateDBRequest {
        email,
        display_name: Some("Test User".to_string()),
        role,
        slug: None,
        password_hash: None,
        // Verified so tests exercise the behavior under test, not the
        // verification gate
        email_verified_at: Some(chrono::Utc::now()),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// Put credits on a user's wallet through the ledger.
pub async fn grant_credits(pool: &PgPool, user_id: UserId, amount: i64) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Wallets::new(&mut conn)
        .apply(&TransactionCreateDBRequest {
            user_id,
            kind: TransactionKind::AdminGrant,
            amount,
            source_id: None,
            description: Some("Test grant".to_string()),
        })
        .await
        .expect("Failed to grant credits");
}
