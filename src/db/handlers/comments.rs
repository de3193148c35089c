//! Database repository for profile comments.

use crate::types::{CommentId, UserId, abbrev_uuid};
use crate::db::{
    errors::Result,
    models::comments::{CommentCreateDBRequest, CommentDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Comments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Comments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(target_id = %abbrev_uuid(&request.target_id)), err)]
    pub async fn create(&mut self, request: &CommentCreateDBRequest) -> Result<CommentDBResponse> {
        let comment = sqlx::query_as::<_, CommentDBResponse>(
            r#"
            INSERT INTO comments (author_id, target_id, body, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.author_id)
        .bind(request.target_id)
        .bind(&request.body)
        .bind(request.status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(comment)
    }

    #[instrument(skip(self), fields(comment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: CommentId) -> Result<Option<CommentDBResponse>> {
        let comment = sqlx::query_as::<_, CommentDBResponse>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(comment)
    }

    /// Public listing: approved comments for a target, newest first.
    #[instrument(skip(self), fields(target_id = %abbrev_uuid(&target_id)), err)]
    pub async fn list_approved_for_target(&mut self, target_id: UserId) -> Result<Vec<CommentDBResponse>> {
        let comments = sqlx::query_as::<_, CommentDBResponse>(
            r#"
            SELECT * FROM comments
            WHERE target_id = $1 AND status = 'approved'
            ORDER BY created_at DESC
            "#,
        )
        .bind(target_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(comments)
    }
}
