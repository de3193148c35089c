//! Database repository for escort profiles.
//!
//! Profiles are created lazily: the first read or patch of `/profile`
//! materializes an empty row. Patches merge into the stored JSONB blobs in a
//! single statement, so concurrent patches to different keys both survive.

use crate::types::{UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    models::profiles::{ProfileDBResponse, ProfileMergeDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch the profile, creating an empty one when missing.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<ProfileDBResponse> {
        sqlx::query("INSERT INTO escort_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM escort_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM escort_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    /// Merge a patch into the profile in one statement.
    ///
    /// `jsonb || jsonb` does a shallow key merge, so two concurrent patches
    /// touching different keys both land. `NULL` patches leave a field as-is.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn merge(&mut self, user_id: UserId, request: &ProfileMergeDBRequest) -> Result<ProfileDBResponse> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE escort_profiles SET
                cities = cities || COALESCE($2, '{}'::jsonb),
                contacts = contacts || COALESCE($3, '{}'::jsonb),
                services = services || COALESCE($4, '{}'::jsonb),
                rates = rates || COALESCE($5, '{}'::jsonb),
                languages = languages || COALESCE($6, '{}'::jsonb),
                consent_at = COALESCE($7, consent_at),
                agency_id = COALESCE($8, agency_id),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.cities)
        .bind(&request.contacts)
        .bind(&request.services)
        .bind(&request.rates)
        .bind(&request.languages)
        .bind(request.consent_at)
        .bind(request.agency_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }

    /// Set the paid tier. Extends from the current expiry when one is still
    /// in the future, otherwise from now.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), tier = %tier), err)]
    pub async fn set_tier(
        &mut self,
        user_id: UserId,
        tier: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ProfileDBResponse> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE escort_profiles SET
                tier = $2,
                tier_expires_at = GREATEST(COALESCE(tier_expires_at, NOW()), NOW()) + ($3 - NOW()),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tier)
        .bind(expires_at)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::create_test_user;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_or_create_is_idempotent(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);

        let first = repo.get_or_create(user.id).await.unwrap();
        let second = repo.get_or_create(user.id).await.unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.tier, "standard");
        assert_eq!(first.cities, json!({}));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_merge_is_shallow_key_merge(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);
        repo.get_or_create(user.id).await.unwrap();

        repo.merge(
            user.id,
            &ProfileMergeDBRequest {
                cities: Some(json!({"berlin": true})),
                rates: Some(json!({"hour": 200})),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // A second patch to a different key keeps the first one
        let merged = repo
            .merge(
                user.id,
                &ProfileMergeDBRequest {
                    cities: Some(json!({"hamburg": true})),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.cities, json!({"berlin": true, "hamburg": true}));
        assert_eq!(merged.rates, json!({"hour": 200}));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_merge_missing_profile_is_not_found(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);

        let result = repo.merge(user.id, &ProfileMergeDBRequest::default()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_active_tier_expiry(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);
        repo.get_or_create(user.id).await.unwrap();

        let expires = Utc::now() + chrono::Duration::days(30);
        let profile = repo.set_tier(user.id, "premium", expires).await.unwrap();

        assert_eq!(profile.active_tier(Utc::now()), "premium");
        assert_eq!(profile.active_tier(Utc::now() + chrono::Duration::days(31)), "standard");
    }
}
