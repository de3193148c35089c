//! Actor loading and role checks.
//!
//! Session tokens carry only the user's identity. The role is read from the
//! database on every gated request so that role changes take effect
//! immediately, without waiting for tokens to expire.

use crate::{
    AppState,
    api::models::users::Role,
    auth::session::AuthUser,
    db::{
        errors::DbError,
        handlers::{repository::Repository, users::Users},
        models::users::UserDBResponse,
    },
    errors::{Error, Result},
};
use sqlx::PgConnection;
use subtle::ConstantTimeEq;
use tracing::{instrument, warn};

/// Load the full user row for an authenticated identity.
///
/// Fails with 401 when the user behind a still-valid token has been deleted.
#[instrument(skip(conn, auth), fields(user_id = %auth.id), err)]
pub async fn load_actor(conn: &mut PgConnection, auth: &AuthUser) -> Result<UserDBResponse> {
    let mut users = Users::new(conn);
    users
        .get_by_id(auth.id)
        .await?
        .ok_or(Error::Unauthenticated {
            message: Some("User no longer exists".to_string()),
        })
}

/// Require the actor to hold the admin role.
pub fn require_admin(actor: &UserDBResponse) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: crate::types::Operation::Moderate,
            resource: "admin".to_string(),
        })
    }
}

/// Require one of the listed roles.
pub fn require_role(actor: &UserDBResponse, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: crate::types::Operation::CreateOwn,
            resource: format!("{:?}", allowed),
        })
    }
}

/// Check the `X-Service-Key` header against the configured key.
///
/// Compared in constant time. Requests without the header, with a mismatched
/// key, or on deployments with no key configured are rejected with 401. This
/// credential never identifies a user and is accepted only by the bulk
/// role-management endpoint.
pub fn verify_service_key(headers: &axum::http::HeaderMap, config: &crate::config::Config) -> Result<()> {
    let Some(expected) = config.auth.service_key.as_deref() else {
        warn!("Service key authentication attempted but no key is configured");
        return Err(Error::Unauthenticated { message: None });
    };

    let provided = headers
        .get("x-service-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::Unauthenticated { message: None })?;

    // Constant-time comparison; the length leak is acceptable
    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        warn!("Service key mismatch");
        Err(Error::Unauthenticated { message: None })
    }
}

/// Grandfathering rule for email verification.
///
/// Accounts created before `auth.email_verification_cutover` may act without
/// a verified email. Everyone else must verify before using gated write
/// operations. With no cutover configured, verification is always required.
pub fn require_verified_email(actor: &UserDBResponse, config: &crate::config::Config) -> Result<()> {
    if actor.email_verified_at.is_some() {
        return Ok(());
    }
    if let Some(cutover) = config.auth.email_verification_cutover {
        if actor.created_at < cutover {
            return Ok(());
        }
    }
    Err(Error::InsufficientPermissions {
        action: crate::types::Operation::UpdateOwn,
        resource: "verified email".to_string(),
    })
}

/// Convenience wrapper: acquire a connection and load the actor.
pub async fn load_actor_from_state(state: &AppState, auth: &AuthUser) -> Result<UserDBResponse> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    load_actor(&mut conn, auth).await
}
