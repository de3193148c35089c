//! Database models for profile comments.

use crate::moderation::ModerationStatus;
use crate::types::{CommentId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CommentCreateDBRequest {
    pub author_id: UserId,
    pub target_id: UserId,
    pub body: String,
    pub status: ModerationStatus,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentDBResponse {
    pub id: CommentId,
    pub author_id: UserId,
    pub target_id: UserId,
    pub body: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
