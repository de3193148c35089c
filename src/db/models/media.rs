//! Database models for moderated media: photos, videos, documents.

use crate::moderation::ModerationStatus;
use crate::types::{DocumentId, PhotoId, UserId, VideoId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PhotoCreateDBRequest {
    pub user_id: UserId,
    pub url: String,
    pub is_face: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhotoDBResponse {
    pub id: PhotoId,
    pub user_id: UserId,
    pub url: String,
    pub is_face: bool,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VideoCreateDBRequest {
    pub user_id: UserId,
    pub url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoDBResponse {
    pub id: VideoId,
    pub user_id: UserId,
    pub url: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DocumentCreateDBRequest {
    pub user_id: UserId,
    pub url: String,
    pub kind: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentDBResponse {
    pub id: DocumentId,
    pub user_id: UserId,
    pub url: String,
    pub kind: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
