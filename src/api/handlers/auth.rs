use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, EmailVerificationConfirmRequest, LoginRequest, LoginResponse,
            LogoutResponse, RegisterRequest, RegisterResponse,
        },
        users::{CurrentUser, Role},
    },
    auth::{password, permissions, session, session::AuthUser},
    db::{
        handlers::{Repository, Users, Wallets},
        models::{
            users::UserCreateDBRequest,
            wallets::{TransactionCreateDBRequest, TransactionKind},
        },
    },
    email::EmailService,
    errors::Error,
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    // Check if registration is allowed
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    validate_password_length(&request.password, &state.config)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Check if user with this email already exists
    let mut user_repo = Users::new(&mut tx);
    if user_repo.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let password_config = state.config.auth.native.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password, &password_config))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        email: request.email,
        display_name: request.display_name,
        role: Role::User,
        slug: None,
        password_hash: Some(password_hash),
        email_verified_at: None,
    };

    let created_user = user_repo.create(&create_request).await?;

    // Give initial credits if configured
    let initial_credits = state.config.credits.initial_credits;
    if initial_credits > 0 {
        let mut wallets = Wallets::new(&mut tx);
        wallets
            .apply(&TransactionCreateDBRequest {
                user_id: created_user.id,
                kind: TransactionKind::AdminGrant,
                amount: initial_credits,
                source_id: Some(format!("registration_{}", created_user.id)),
                description: Some("Initial credits on account creation".to_string()),
            })
            .await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Send the verification link; registration still succeeds if the mail
    // bounces, the user can request another
    let verify_token = session::create_email_verify_token(created_user.id, &created_user.email, &state.config)?;
    let email_service = EmailService::new(&state.config)?;
    if let Err(e) = email_service
        .send_verification_email(&created_user.email, created_user.display_name.as_deref(), &verify_token)
        .await
    {
        tracing::warn!("Failed to send verification email to {}: {:?}", created_user.email, e);
    }

    // Create session token
    let token = session::create_session_token(created_user.id, &created_user.email, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: CurrentUser::from(created_user),
        message: "Registration successful".to_string(),
    };

    Ok(RegisterResponse { auth_response, cookie })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut user_repo = Users::new(&mut pool_conn);

    // Find user by email
    let user = user_repo
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    let password_hash = user.password_hash.as_ref().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    // Accounts created after the cutover must verify their address first
    permissions::require_verified_email(&user, &state.config)?;

    user_repo.touch_last_login(user.id).await?;

    // Create session token
    let token = session::create_session_token(user.id, &user.email, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: CurrentUser::from(user),
        message: "Login successful".to_string(),
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    // Create expired cookie to clear session
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        state.config.auth.native.session.cookie_name
    );

    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Resend the email verification link
#[utoipa::path(
    post,
    path = "/authentication/email-verifications",
    tag = "authentication",
    responses(
        (status = 200, description = "Verification email sent", body = AuthSuccessResponse),
        (status = 400, description = "Email already verified"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn request_email_verification(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AuthSuccessResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    if actor.email_verified_at.is_some() {
        return Err(Error::BadRequest {
            message: "Email address is already verified".to_string(),
        });
    }

    let token = session::create_email_verify_token(actor.id, &actor.email, &state.config)?;
    let email_service = EmailService::new(&state.config)?;
    email_service
        .send_verification_email(&actor.email, actor.display_name.as_deref(), &token)
        .await?;

    Ok(Json(AuthSuccessResponse {
        message: "Verification email sent".to_string(),
    }))
}

/// Confirm an email verification token
#[utoipa::path(
    post,
    path = "/authentication/email-verifications/confirm",
    request_body = EmailVerificationConfirmRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Email verified", body = AuthSuccessResponse),
        (status = 401, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_email_verification(
    State(state): State<AppState>,
    Json(request): Json<EmailVerificationConfirmRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    let verified = session::verify_email_verify_token(&request.token, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_by_id(verified.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User no longer exists".to_string()),
    })?;

    // Idempotent: confirming twice keeps the original timestamp
    if user.email_verified_at.is_none() {
        user_repo
            .update(
                user.id,
                &crate::db::models::users::UserUpdateDBRequest {
                    email_verified_at: Some(chrono::Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
    }

    Ok(Json(AuthSuccessResponse {
        message: "Email verified".to_string(),
    }))
}

fn validate_password_length(password: &str, config: &crate::config::Config) -> Result<(), Error> {
    let password_config = &config.auth.native.password;
    if password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = config.auth.security.token_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}
