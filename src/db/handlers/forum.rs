//! Database repository for forum threads and posts.

use crate::types::{PostId, ThreadId, UserId, abbrev_uuid};
use crate::db::{
    errors::Result,
    models::forum::{PostCreateDBRequest, PostDBResponse, ThreadCreateDBRequest, ThreadDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Forum<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Forum<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(author_id = %abbrev_uuid(&request.author_id)), err)]
    pub async fn create_thread(&mut self, request: &ThreadCreateDBRequest) -> Result<ThreadDBResponse> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(
            "INSERT INTO forum_threads (author_id, title, body) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.author_id)
        .bind(&request.title)
        .bind(&request.body)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(thread)
    }

    #[instrument(skip(self), fields(thread_id = %abbrev_uuid(&id)), err)]
    pub async fn get_thread(&mut self, id: ThreadId) -> Result<Option<ThreadDBResponse>> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>("SELECT * FROM forum_threads WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(thread)
    }

    /// Threads, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_threads(&mut self, skip: i64, limit: i64) -> Result<Vec<ThreadDBResponse>> {
        let threads = sqlx::query_as::<_, ThreadDBResponse>(
            "SELECT * FROM forum_threads ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(threads)
    }

    #[instrument(skip(self, request), fields(thread_id = %abbrev_uuid(&request.thread_id)), err)]
    pub async fn create_post(&mut self, request: &PostCreateDBRequest) -> Result<PostDBResponse> {
        let post = sqlx::query_as::<_, PostDBResponse>(
            "INSERT INTO forum_posts (thread_id, author_id, body) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.thread_id)
        .bind(request.author_id)
        .bind(&request.body)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(post)
    }

    /// Posts within a thread, oldest first (reading order).
    #[instrument(skip(self), fields(thread_id = %abbrev_uuid(&thread_id)), err)]
    pub async fn list_posts(&mut self, thread_id: ThreadId, skip: i64, limit: i64) -> Result<Vec<PostDBResponse>> {
        let posts = sqlx::query_as::<_, PostDBResponse>(
            "SELECT * FROM forum_posts WHERE thread_id = $1 ORDER BY created_at ASC LIMIT $2 OFFSET $3",
        )
        .bind(thread_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::errors::DbError;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_thread_and_posts(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Forum::new(&mut conn);

        let thread = repo
            .create_thread(&ThreadCreateDBRequest {
                author_id: author.id,
                title: "First".to_string(),
                body: "Hello".to_string(),
            })
            .await
            .unwrap();

        for body in ["one", "two"] {
            repo.create_post(&PostCreateDBRequest {
                thread_id: thread.id,
                author_id: author.id,
                body: body.to_string(),
            })
            .await
            .unwrap();
        }

        let posts = repo.list_posts(thread.id, 0, 10).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].body, "one");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_post_requires_existing_thread(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Forum::new(&mut conn);

        let result = repo
            .create_post(&PostCreateDBRequest {
                thread_id: uuid::Uuid::new_v4(),
                author_id: author.id,
                body: "orphan".to_string(),
            })
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
