//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern; the CRUD-shaped ones implement
//! the [`Repository`] trait, the rest expose entity-specific operations.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//! - Uses the connection's transaction for ACID guarantees
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts and roles
//! - [`Profiles`]: Escort profile documents, JSONB merges, tiers
//! - [`Photos`], [`Videos`], [`Documents`]: moderated media
//! - [`Reviews`], [`Comments`]: user-generated content on profiles
//! - [`Wallets`]: wallet balances, the credit ledger, purchase orders
//! - [`Forum`]: threads and posts
//! - [`Moderation`]: admin queues and status decisions across all kinds
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use vitrine::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     // Start a transaction
//!     let mut tx = pool.begin().await?;
//!
//!     // Create repository from transaction
//!     let mut repo = Users::new(&mut tx);
//!
//!     // Perform operations
//!     let user = repo.get_user_by_email("user@example.com").await?;
//!
//!     // Commit or rollback
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod comments;
pub mod forum;
pub mod media;
pub mod moderation;
pub mod profiles;
pub mod repository;
pub mod reviews;
pub mod users;
pub mod wallets;

pub use comments::Comments;
pub use forum::Forum;
pub use media::{Documents, Photos, Videos};
pub use moderation::Moderation;
pub use profiles::Profiles;
pub use repository::Repository;
pub use reviews::Reviews;
pub use users::Users;
pub use wallets::Wallets;
