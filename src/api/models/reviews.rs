//! API request/response models for reviews.

use crate::db::models::reviews::ReviewDBResponse;
use crate::moderation::ModerationStatus;
use crate::types::{ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreate {
    /// Rating from 1 to 5
    pub rating: i32,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub target_id: UserId,
    pub rating: i32,
    pub title: String,
    pub body: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDBResponse> for ReviewResponse {
    fn from(db: ReviewDBResponse) -> Self {
        Self {
            id: db.id,
            author_id: db.author_id,
            target_id: db.target_id,
            rating: db.rating,
            title: db.title,
            body: db.body,
            status: db.status,
            created_at: db.created_at,
        }
    }
}
