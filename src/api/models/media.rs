//! API request/response models for photos, videos, and documents.

use crate::db::models::media::{DocumentDBResponse, PhotoDBResponse, VideoDBResponse};
use crate::moderation::ModerationStatus;
use crate::types::{DocumentId, PhotoId, UserId, VideoId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoCreate {
    pub url: String,
    /// Whether this photo shows the owner's face; at least one face shot is
    /// required before a portfolio can be submitted for review
    #[serde(default)]
    pub is_face: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PhotoId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub url: String,
    pub is_face: bool,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PhotoDBResponse> for PhotoResponse {
    fn from(db: PhotoDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            url: db.url,
            is_face: db.is_face,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Result of a bulk portfolio submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkSubmitResponse {
    /// Number of photos moved to review
    pub submitted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoCreate {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: VideoId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub url: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoDBResponse> for VideoResponse {
    fn from(db: VideoDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            url: db.url,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentCreate {
    pub url: String,
    /// Kind of document, e.g. "id_card" or "proof_of_age"
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DocumentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub url: String,
    pub kind: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentDBResponse> for DocumentResponse {
    fn from(db: DocumentDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            url: db.url,
            kind: db.kind,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
