//! API models for the admin moderation surface.

use crate::db::handlers::moderation::ModerationQueueItem;
use crate::moderation::ModerationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One entry in a moderation queue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: Uuid,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ModerationQueueItem> for QueueItemResponse {
    fn from(item: ModerationQueueItem) -> Self {
        Self {
            id: item.id,
            owner_id: item.owner_id,
            status: item.status,
            created_at: item.created_at,
        }
    }
}

/// Admin status decision on a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusDecisionRequest {
    pub status: ModerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusDecisionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub status: ModerationStatus,
}
