//! Escort profile endpoints.
//!
//! `/profile` is the owner surface: reads lazily create an empty profile,
//! patches merge JSONB blobs key-by-key. `/profiles/{slug}` is the public
//! read and only ever exposes counts of approved media.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::profiles::{ProfilePatch, ProfileResponse, PublicProfileResponse, TierUpgradeRequest},
    api::models::users::Role,
    auth::{permissions, session::AuthUser},
    db::handlers::{Photos, Profiles, Users, Videos, Wallets},
    db::models::wallets::{TransactionCreateDBRequest, TransactionKind},
    errors::Error,
};

const TIERS: &[&str] = &["premium", "featured"];

/// Get the caller's own profile, creating it when missing
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profiles",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_own_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<ProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency, Role::Admin])?;

    let profile = Profiles::new(&mut conn).get_or_create(actor.id).await?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Merge a patch into the caller's own profile
#[utoipa::path(
    patch,
    path = "/api/v1/profile",
    request_body = ProfilePatch,
    tag = "profiles",
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Blob fields must be JSON objects"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn patch_own_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileResponse>, Error> {
    validate_blobs(&patch)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency, Role::Admin])?;

    let mut profiles = Profiles::new(&mut conn);
    profiles.get_or_create(actor.id).await?;
    let profile = profiles.merge(actor.id, &patch.into()).await?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Public profile lookup by slug
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{slug}",
    params(("slug" = String, Path, description = "Public profile slug")),
    tag = "profiles",
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "No such profile"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_user_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Profile".to_string(),
            id: slug.clone(),
        })?;

    let profile = Profiles::new(&mut conn)
        .get_by_user_id(user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Profile".to_string(),
            id: slug.clone(),
        })?;

    let approved_photos = Photos::new(&mut conn).count_approved(user.id).await?;
    let approved_videos = Videos::new(&mut conn).count_approved(user.id).await?;

    let tier = profile.active_tier(chrono::Utc::now()).to_string();
    Ok(Json(PublicProfileResponse {
        slug,
        display_name: user.display_name,
        tier,
        cities: profile.cities,
        contacts: profile.contacts,
        services: profile.services,
        rates: profile.rates,
        languages: profile.languages,
        approved_photos,
        approved_videos,
    }))
}

/// Spend credits on a profile tier upgrade
#[utoipa::path(
    post,
    path = "/api/v1/profile/tier-upgrade",
    request_body = TierUpgradeRequest,
    tag = "profiles",
    responses(
        (status = 200, description = "Upgraded profile", body = ProfileResponse),
        (status = 400, description = "Unknown tier or insufficient balance"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upgrade_tier(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<TierUpgradeRequest>,
) -> Result<Json<ProfileResponse>, Error> {
    if !TIERS.contains(&request.tier.as_str()) {
        return Err(Error::BadRequest {
            message: format!("Unknown tier '{}'", request.tier),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency])?;

    let cost = state.config.credits.tier_upgrade_cost;
    let expires_at = chrono::Utc::now()
        + chrono::Duration::from_std(state.config.credits.tier_upgrade_duration).map_err(|e| Error::Internal {
            operation: format!("tier upgrade duration out of range: {e}"),
        })?;

    // Spend and upgrade atomically; an overdraft rolls the whole thing back
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    Profiles::new(&mut tx).get_or_create(actor.id).await?;

    Wallets::new(&mut tx)
        .apply(&TransactionCreateDBRequest {
            user_id: actor.id,
            amount: -cost,
            kind: TransactionKind::Spend,
            description: Some(format!("Tier upgrade to {}", request.tier)),
            source_id: None,
        })
        .await?;

    let profile = Profiles::new(&mut tx).set_tier(actor.id, &request.tier, expires_at).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Blob fields merge into JSONB objects, so each one has to be an object.
fn validate_blobs(patch: &ProfilePatch) -> Result<(), Error> {
    let blobs = [
        ("cities", &patch.cities),
        ("contacts", &patch.contacts),
        ("services", &patch.services),
        ("rates", &patch.rates),
        ("languages", &patch.languages),
    ];

    for (name, value) in blobs {
        if let Some(value) = value
            && !value.is_object()
        {
            return Err(Error::BadRequest {
                message: format!("Field '{name}' must be a JSON object"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserUpdate;
    use crate::test_utils::{create_test_app, create_test_app_with_user, create_test_user, grant_credits};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_get_creates_profile_lazily(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server.get("/api/v1/profile").await;
        response.assert_status_ok();

        let body: ProfileResponse = response.json();
        assert_eq!(body.user_id, user.id);
        assert_eq!(body.tier, "standard");
    }

    #[sqlx::test]
    async fn test_patch_merges_blobs(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        server
            .patch("/api/v1/profile")
            .json(&json!({"cities": {"berlin": true}}))
            .await
            .assert_status_ok();

        let response = server
            .patch("/api/v1/profile")
            .json(&json!({"cities": {"hamburg": true}, "consent": true}))
            .await;
        response.assert_status_ok();

        let body: ProfileResponse = response.json();
        assert_eq!(body.cities, json!({"berlin": true, "hamburg": true}));
        assert!(body.consent_at.is_some());
    }

    #[sqlx::test]
    async fn test_patch_rejects_non_object_blob(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server.patch("/api/v1/profile").json(&json!({"cities": [1, 2, 3]})).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_plain_users_have_no_profile(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server.get("/api/v1/profile").await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_public_profile_by_slug(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool.clone(), &user).await;

        server
            .patch("/api/v1/users/current")
            .json(&UserUpdate {
                display_name: Some("Jane".to_string()),
                slug: Some("jane".to_string()),
            })
            .await
            .assert_status_ok();
        server
            .patch("/api/v1/profile")
            .json(&json!({"rates": {"hour": 200}}))
            .await
            .assert_status_ok();

        // Public lookup needs no session
        let server = create_test_app(pool).await;
        let response = server.get("/api/v1/profiles/jane").await;
        response.assert_status_ok();

        let body: PublicProfileResponse = response.json();
        assert_eq!(body.slug, "jane");
        assert_eq!(body.display_name, Some("Jane".to_string()));
        assert_eq!(body.rates, json!({"hour": 200}));
        assert_eq!(body.approved_photos, 0);
    }

    #[sqlx::test]
    async fn test_public_profile_unknown_slug(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/api/v1/profiles/nobody").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_tier_upgrade_spends_credits(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        grant_credits(&pool, user.id, 150).await;
        let server = create_test_app_with_user(pool.clone(), &user).await;

        let response = server
            .post("/api/v1/profile/tier-upgrade")
            .json(&TierUpgradeRequest {
                tier: "premium".to_string(),
            })
            .await;
        response.assert_status_ok();

        let body: ProfileResponse = response.json();
        assert_eq!(body.tier, "premium");
        assert!(body.tier_expires_at.is_some());

        let mut conn = pool.acquire().await.unwrap();
        let wallet = Wallets::new(&mut conn).get_or_create(user.id).await.unwrap();
        assert_eq!(wallet.balance, 50); // default cost is 100
    }

    #[sqlx::test]
    async fn test_tier_upgrade_insufficient_balance(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool.clone(), &user).await;

        let response = server
            .post("/api/v1/profile/tier-upgrade")
            .json(&TierUpgradeRequest {
                tier: "premium".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        // Nothing changed
        let mut conn = pool.acquire().await.unwrap();
        let profile = Profiles::new(&mut conn).get_by_user_id(user.id).await.unwrap();
        assert!(profile.is_none_or(|p| p.tier == "standard"));
    }

    #[sqlx::test]
    async fn test_tier_upgrade_unknown_tier(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server
            .post("/api/v1/profile/tier-upgrade")
            .json(&TierUpgradeRequest {
                tier: "diamond".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}
