//! Database repository for reviews.

use crate::moderation::ModerationStatus;
use crate::types::{ReviewId, UserId, abbrev_uuid};
use crate::db::{
    errors::Result,
    models::reviews::{ReviewCreateDBRequest, ReviewDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Reviews<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reviews<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(target_id = %abbrev_uuid(&request.target_id)), err)]
    pub async fn create(&mut self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(
            r#"
            INSERT INTO reviews (author_id, target_id, rating, title, body, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.author_id)
        .bind(request.target_id)
        .bind(request.rating)
        .bind(&request.title)
        .bind(&request.body)
        .bind(request.status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(review)
    }

    #[instrument(skip(self), fields(review_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ReviewId) -> Result<Option<ReviewDBResponse>> {
        let review = sqlx::query_as::<_, ReviewDBResponse>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(review)
    }

    /// Public listing: approved reviews for a target, newest first.
    #[instrument(skip(self), fields(target_id = %abbrev_uuid(&target_id)), err)]
    pub async fn list_approved_for_target(&mut self, target_id: UserId) -> Result<Vec<ReviewDBResponse>> {
        let reviews = sqlx::query_as::<_, ReviewDBResponse>(
            r#"
            SELECT * FROM reviews
            WHERE target_id = $1 AND status = 'approved'
            ORDER BY created_at DESC
            "#,
        )
        .bind(target_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_rating_check_enforced_by_schema(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();

        let result = Reviews::new(&mut conn)
            .create(&ReviewCreateDBRequest {
                author_id: author.id,
                target_id: target.id,
                rating: 6,
                title: "Too good".to_string(),
                body: "Off the scale".to_string(),
                status: ModerationStatus::InReview,
            })
            .await;

        assert!(matches!(result, Err(crate::db::errors::DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_listing_is_approved_only(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reviews::new(&mut conn);

        let pending = repo
            .create(&ReviewCreateDBRequest {
                author_id: author.id,
                target_id: target.id,
                rating: 4,
                title: "Pending".to_string(),
                body: "Awaiting moderation".to_string(),
                status: ModerationStatus::InReview,
            })
            .await
            .unwrap();
        let approved = repo
            .create(&ReviewCreateDBRequest {
                author_id: author.id,
                target_id: target.id,
                rating: 5,
                title: "Visible".to_string(),
                body: "Approved immediately".to_string(),
                status: ModerationStatus::Approved,
            })
            .await
            .unwrap();

        let listed = repo.list_approved_for_target(target.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, approved.id);
        assert_ne!(listed[0].id, pending.id);
    }
}
