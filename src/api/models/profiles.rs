//! API request/response models for escort profiles.

use crate::db::models::profiles::{ProfileDBResponse, ProfileMergeDBRequest};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Patch for the caller's own profile. Each JSONB field is merged key-by-key
/// into the stored document; omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfilePatch {
    #[schema(value_type = Object)]
    pub cities: Option<Value>,
    #[schema(value_type = Object)]
    pub contacts: Option<Value>,
    #[schema(value_type = Object)]
    pub services: Option<Value>,
    #[schema(value_type = Object)]
    pub rates: Option<Value>,
    #[schema(value_type = Object)]
    pub languages: Option<Value>,
    /// Set to true to record consent now
    pub consent: Option<bool>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agency_id: Option<UserId>,
}

impl From<ProfilePatch> for ProfileMergeDBRequest {
    fn from(patch: ProfilePatch) -> Self {
        Self {
            cities: patch.cities,
            contacts: patch.contacts,
            services: patch.services,
            rates: patch.rates,
            languages: patch.languages,
            consent_at: patch.consent.unwrap_or(false).then(Utc::now),
            agency_id: patch.agency_id,
        }
    }
}

/// Owner view of a profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agency_id: Option<UserId>,
    pub tier: String,
    pub tier_expires_at: Option<DateTime<Utc>>,
    pub consent_at: Option<DateTime<Utc>>,
    #[schema(value_type = Object)]
    pub cities: Value,
    #[schema(value_type = Object)]
    pub contacts: Value,
    #[schema(value_type = Object)]
    pub services: Value,
    #[schema(value_type = Object)]
    pub rates: Value,
    #[schema(value_type = Object)]
    pub languages: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            agency_id: db.agency_id,
            tier: db.tier,
            tier_expires_at: db.tier_expires_at,
            consent_at: db.consent_at,
            cities: db.cities,
            contacts: db.contacts,
            services: db.services,
            rates: db.rates,
            languages: db.languages,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Public view of a profile, looked up by slug. Media is reported as counts
/// of approved items only; nothing pending or rejected leaks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicProfileResponse {
    pub slug: String,
    pub display_name: Option<String>,
    pub tier: String,
    #[schema(value_type = Object)]
    pub cities: Value,
    #[schema(value_type = Object)]
    pub contacts: Value,
    #[schema(value_type = Object)]
    pub services: Value,
    #[schema(value_type = Object)]
    pub rates: Value,
    #[schema(value_type = Object)]
    pub languages: Value,
    pub approved_photos: i64,
    pub approved_videos: i64,
}

/// Spend credits on a profile tier upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TierUpgradeRequest {
    /// Tier to upgrade to
    pub tier: String,
}
