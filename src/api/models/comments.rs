//! API request/response models for profile comments.

use crate::db::models::comments::CommentDBResponse;
use crate::moderation::ModerationStatus;
use crate::types::{CommentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentCreate {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CommentId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub target_id: UserId,
    pub body: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<CommentDBResponse> for CommentResponse {
    fn from(db: CommentDBResponse) -> Self {
        Self {
            id: db.id,
            author_id: db.author_id,
            target_id: db.target_id,
            body: db.body,
            status: db.status,
            created_at: db.created_at,
        }
    }
}
