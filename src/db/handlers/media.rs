//! Database repositories for photos, videos, and verification documents.
//!
//! All three carry a moderation status. Owner-facing status changes are
//! conditional updates (`WHERE id AND user_id AND status = from`) so a
//! concurrent admin decision cannot be clobbered; zero rows affected means
//! the caller re-reads and reports accordingly.

use crate::moderation::ModerationStatus;
use crate::types::{DocumentId, PhotoId, UserId, VideoId, abbrev_uuid};
use crate::db::{
    errors::Result,
    models::media::{
        DocumentCreateDBRequest, DocumentDBResponse, PhotoCreateDBRequest, PhotoDBResponse,
        VideoCreateDBRequest, VideoDBResponse,
    },
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Photos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Photos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &PhotoCreateDBRequest) -> Result<PhotoDBResponse> {
        let photo = sqlx::query_as::<_, PhotoDBResponse>(
            "INSERT INTO photos (user_id, url, is_face) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.user_id)
        .bind(&request.url)
        .bind(request.is_face)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(photo)
    }

    #[instrument(skip(self), fields(photo_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: PhotoId) -> Result<Option<PhotoDBResponse>> {
        let photo = sqlx::query_as::<_, PhotoDBResponse>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(photo)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<PhotoDBResponse>> {
        let photos = sqlx::query_as::<_, PhotoDBResponse>(
            "SELECT * FROM photos WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(photos)
    }

    /// Owner status transition. Returns the updated row, or `None` when the
    /// row no longer matches (gone, not owned, or status already moved).
    #[instrument(skip(self), fields(photo_id = %abbrev_uuid(&id), from = %from, to = %to), err)]
    pub async fn update_status(
        &mut self,
        id: PhotoId,
        owner: UserId,
        from: ModerationStatus,
        to: ModerationStatus,
    ) -> Result<Option<PhotoDBResponse>> {
        let photo = sqlx::query_as::<_, PhotoDBResponse>(
            r#"
            UPDATE photos SET status = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(photo)
    }

    /// Move every draft photo of the owner to review in one statement,
    /// provided the portfolio holds at least `min_total` photos and one face
    /// shot. Run inside a transaction: the precondition and the update see
    /// the same snapshot.
    ///
    /// Returns the number of photos moved, or `None` when the precondition
    /// fails (nothing is changed).
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn submit_all_drafts(&mut self, user_id: UserId, min_total: i64) -> Result<Option<u64>> {
        let (total, faces): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_face)
            FROM photos WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        if total < min_total || faces < 1 {
            return Ok(None);
        }

        let result = sqlx::query("UPDATE photos SET status = 'in_review', updated_at = NOW() WHERE user_id = $1 AND status = 'draft'")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(Some(result.rows_affected()))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_approved(&mut self, user_id: UserId) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM photos WHERE user_id = $1 AND status = 'approved'")
                .bind(user_id)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(count)
    }
}

pub struct Videos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Videos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &VideoCreateDBRequest) -> Result<VideoDBResponse> {
        let video = sqlx::query_as::<_, VideoDBResponse>(
            "INSERT INTO videos (user_id, url) VALUES ($1, $2) RETURNING *",
        )
        .bind(request.user_id)
        .bind(&request.url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(video)
    }

    #[instrument(skip(self), fields(video_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: VideoId) -> Result<Option<VideoDBResponse>> {
        let video = sqlx::query_as::<_, VideoDBResponse>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(video)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<VideoDBResponse>> {
        let videos = sqlx::query_as::<_, VideoDBResponse>(
            "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self), fields(video_id = %abbrev_uuid(&id), from = %from, to = %to), err)]
    pub async fn update_status(
        &mut self,
        id: VideoId,
        owner: UserId,
        from: ModerationStatus,
        to: ModerationStatus,
    ) -> Result<Option<VideoDBResponse>> {
        let video = sqlx::query_as::<_, VideoDBResponse>(
            r#"
            UPDATE videos SET status = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(video)
    }

    /// Owner delete, any status. Returns false when nothing matched.
    #[instrument(skip(self), fields(video_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_owned(&mut self, id: VideoId, owner: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_approved(&mut self, user_id: UserId) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM videos WHERE user_id = $1 AND status = 'approved'")
                .bind(user_id)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(count)
    }
}

pub struct Documents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Documents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), kind = %request.kind), err)]
    pub async fn create(&mut self, request: &DocumentCreateDBRequest) -> Result<DocumentDBResponse> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(
            "INSERT INTO documents (user_id, url, kind) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.user_id)
        .bind(&request.url)
        .bind(&request.kind)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: DocumentId) -> Result<Option<DocumentDBResponse>> {
        let document = sqlx::query_as::<_, DocumentDBResponse>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(document)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<DocumentDBResponse>> {
        let documents = sqlx::query_as::<_, DocumentDBResponse>(
            "SELECT * FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(documents)
    }

    /// Owner delete. Refuses rows under review at the SQL level; the caller
    /// distinguishes "under review" from "not yours/absent" by re-reading.
    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_owned(&mut self, id: DocumentId, owner: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND user_id = $2 AND status <> 'in_review'")
            .bind(id)
            .bind(owner)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::create_test_user;
    use sqlx::{Connection, PgPool};

    async fn add_photo(pool: &PgPool, user_id: UserId, is_face: bool) -> PhotoDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Photos::new(&mut conn)
            .create(&PhotoCreateDBRequest {
                user_id,
                url: "https://cdn.example.com/p.jpg".to_string(),
                is_face,
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_photo_starts_as_draft(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let photo = add_photo(&pool, user.id, false).await;
        assert_eq!(photo.status, ModerationStatus::Draft);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_owner_conditional_update_respects_owner(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Escort).await;
        let other = create_test_user(&pool, Role::Escort).await;
        let photo = add_photo(&pool, owner.id, true).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Photos::new(&mut conn);

        // Someone else's id: no row matches
        let missed = repo
            .update_status(photo.id, other.id, ModerationStatus::Draft, ModerationStatus::InReview)
            .await
            .unwrap();
        assert!(missed.is_none());

        let moved = repo
            .update_status(photo.id, owner.id, ModerationStatus::Draft, ModerationStatus::InReview)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, ModerationStatus::InReview);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_submit_requires_three_photos_and_a_face(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        add_photo(&pool, user.id, false).await;
        add_photo(&pool, user.id, false).await;

        let mut conn = pool.acquire().await.unwrap();

        // Two photos: precondition fails, nothing moves
        let mut tx = conn.begin().await.unwrap();
        let moved = Photos::new(&mut tx).submit_all_drafts(user.id, 3).await.unwrap();
        tx.commit().await.unwrap();
        assert!(moved.is_none());

        // Three photos but no face: still fails
        add_photo(&pool, user.id, false).await;
        let mut tx = conn.begin().await.unwrap();
        let moved = Photos::new(&mut tx).submit_all_drafts(user.id, 3).await.unwrap();
        tx.commit().await.unwrap();
        assert!(moved.is_none());

        let photos = Photos::new(&mut conn).list_for_user(user.id).await.unwrap();
        assert!(photos.iter().all(|p| p.status == ModerationStatus::Draft));

        // A face shot completes the portfolio
        add_photo(&pool, user.id, true).await;
        let mut tx = conn.begin().await.unwrap();
        let moved = Photos::new(&mut tx).submit_all_drafts(user.id, 3).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(moved, Some(4));

        let photos = Photos::new(&mut conn).list_for_user(user.id).await.unwrap();
        assert!(photos.iter().all(|p| p.status == ModerationStatus::InReview));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_video_delete_any_status(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let video = Videos::new(&mut conn)
            .create(&VideoCreateDBRequest {
                user_id: user.id,
                url: "https://cdn.example.com/v.mp4".to_string(),
            })
            .await
            .unwrap();

        Videos::new(&mut conn)
            .update_status(video.id, user.id, ModerationStatus::Draft, ModerationStatus::InReview)
            .await
            .unwrap();

        assert!(Videos::new(&mut conn).delete_owned(video.id, user.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_document_delete_blocked_in_review(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let mut conn = pool.acquire().await.unwrap();
        let document = Documents::new(&mut conn)
            .create(&DocumentCreateDBRequest {
                user_id: user.id,
                url: "https://cdn.example.com/id.pdf".to_string(),
                kind: "id_card".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(document.status, ModerationStatus::InReview);

        // Documents enter review immediately, so deletion is blocked
        assert!(!Documents::new(&mut conn).delete_owned(document.id, user.id).await.unwrap());

        sqlx::query("UPDATE documents SET status = 'approved' WHERE id = $1")
            .bind(document.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        assert!(Documents::new(&mut conn).delete_owned(document.id, user.id).await.unwrap());
    }
}
