//! Database models for reviews.

use crate::moderation::ModerationStatus;
use crate::types::{ReviewId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub author_id: UserId,
    pub target_id: UserId,
    pub rating: i32,
    pub title: String,
    pub body: String,
    pub status: ModerationStatus,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub author_id: UserId,
    pub target_id: UserId,
    pub rating: i32,
    pub title: String,
    pub body: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
