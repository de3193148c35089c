//! Database models for escort profiles.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Patch applied to a profile. Each JSONB field is merged into the stored
/// document in a single statement; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileMergeDBRequest {
    pub cities: Option<Value>,
    pub contacts: Option<Value>,
    pub services: Option<Value>,
    pub rates: Option<Value>,
    pub languages: Option<Value>,
    pub consent_at: Option<DateTime<Utc>>,
    pub agency_id: Option<UserId>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileDBResponse {
    pub user_id: UserId,
    pub agency_id: Option<UserId>,
    pub tier: String,
    pub tier_expires_at: Option<DateTime<Utc>>,
    pub consent_at: Option<DateTime<Utc>>,
    pub cities: Value,
    pub contacts: Value,
    pub services: Value,
    pub rates: Value,
    pub languages: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileDBResponse {
    /// A tier counts as active while unexpired.
    pub fn active_tier(&self, now: DateTime<Utc>) -> &str {
        match self.tier_expires_at {
            Some(expires) if expires <= now => "standard",
            _ => &self.tier,
        }
    }
}
