//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of a user account. One role per user, stored as TEXT.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Escort,
    Agency,
    Admin,
}

/// Self-service profile fields on the account itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    /// Public profile slug; must be unique across the site.
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub slug: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            display_name: db.display_name,
            role: db.role,
            slug: db.slug,
            email_verified: db.email_verified_at.is_some(),
            created_at: db.created_at,
            last_login: db.last_login,
        }
    }
}

/// One entry in a bulk role assignment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignment {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub role: Role,
}

/// Bulk role management request, accepted from admins or trusted services.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRoleUpdateRequest {
    pub assignments: Vec<RoleAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRoleUpdateResponse {
    /// Users whose role was changed
    pub updated: usize,
    /// User ids that did not exist
    #[schema(value_type = Vec<String>)]
    pub missing: Vec<UserId>,
}
