//! API request/response models for the forum.

use crate::db::models::forum::{PostDBResponse, ThreadDBResponse};
use crate::types::{PostId, ThreadId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadCreate {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ThreadId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<ThreadDBResponse> for ThreadResponse {
    fn from(db: ThreadDBResponse) -> Self {
        Self {
            id: db.id,
            author_id: db.author_id,
            title: db.title,
            body: db.body,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostCreate {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    #[schema(value_type = String, format = "uuid")]
    pub thread_id: ThreadId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostDBResponse> for PostResponse {
    fn from(db: PostDBResponse) -> Self {
        Self {
            id: db.id,
            thread_id: db.thread_id,
            author_id: db.author_id,
            body: db.body,
            created_at: db.created_at,
        }
    }
}

/// A thread with its first page of posts, oldest post first. Longer
/// threads page through the posts listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: ThreadResponse,
    pub posts: Vec<PostResponse>,
}
