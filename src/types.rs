//! Common type definitions.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, PhotoId, etc.)
//! - The [`Operation`] enum named in authorization errors
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety
//! (the ledger is the exception: transaction rows use a sequential i64).
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type PhotoId = Uuid;
pub type VideoId = Uuid;
pub type DocumentId = Uuid;
pub type ReviewId = Uuid;
pub type CommentId = Uuid;
pub type ThreadId = Uuid;
pub type PostId = Uuid;
pub type OrderId = Uuid;
pub type TransactionId = i64;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// The operation a denied request was attempting, named in 403 responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateOwn,
    UpdateOwn,
    // Moderation decisions are inherently an admin-side operation
    Moderate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateOwn => write!(f, "Create"),
            Operation::UpdateOwn => write!(f, "Update"),
            Operation::Moderate => write!(f, "Moderate"),
        }
    }
}
