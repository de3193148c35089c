//! Database models for the forum.

use crate::types::{PostId, ThreadId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ThreadCreateDBRequest {
    pub author_id: UserId,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThreadDBResponse {
    pub id: ThreadId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub body: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostDBResponse {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
