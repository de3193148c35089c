//! Moderation state machine shared by photos, videos, documents, reviews and
//! comments.
//!
//! Content moves `Draft -> InReview -> {Approved, Rejected}`. Owners may only
//! submit (`Draft -> InReview`) and withdraw (`InReview -> Draft`); admins may
//! set any state from any state, including resetting terminal ones.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// Moderation status of a piece of user-submitted content, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Draft => "draft",
            ModerationStatus::InReview => "in_review",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate an owner self-service transition.
///
/// Owners can submit drafts for review and withdraw pending submissions;
/// everything else (including touching terminal states) needs an admin.
pub fn check_owner_transition(from: ModerationStatus, to: ModerationStatus) -> Result<()> {
    match (from, to) {
        (ModerationStatus::Draft, ModerationStatus::InReview) => Ok(()),
        (ModerationStatus::InReview, ModerationStatus::Draft) => Ok(()),
        _ => Err(Error::BadRequest {
            message: format!("Cannot change status from {from} to {to}"),
        }),
    }
}

/// The kinds of content that carry a moderation status. Used to address the
/// per-kind moderation queues and status decisions on the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Photos,
    Videos,
    Documents,
    Reviews,
    Comments,
}

impl ContentKind {
    /// Table holding this kind of content. All five share the same
    /// `(id, user/author, status)` moderation columns.
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Photos => "photos",
            ContentKind::Videos => "videos",
            ContentKind::Documents => "documents",
            ContentKind::Reviews => "reviews",
            ContentKind::Comments => "comments",
        }
    }

    /// Column naming the owner of a row in this kind's table.
    pub fn owner_column(&self) -> &'static str {
        match self {
            ContentKind::Photos | ContentKind::Videos | ContentKind::Documents => "user_id",
            ContentKind::Reviews | ContentKind::Comments => "author_id",
        }
    }
}
