//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//!
//! # Model Categories
//!
//! - [`users`]: User accounts and roles
//! - [`profiles`]: Escort profile documents and tiers
//! - [`media`]: Photos, videos, and verification documents
//! - [`reviews`], [`comments`]: User-generated content on profiles
//! - [`wallets`]: Wallet balances, the credit ledger, and purchase orders
//! - [`forum`]: Threads and posts
//!
//! # Conversion to API Models
//!
//! Database models typically implement `From` or `Into` conversions to API models:
//!
//! ```ignore
//! use vitrine::db::models::users::UserDBResponse;
//! use vitrine::api::models::users::UserResponse;
//!
//! let db_user: UserDBResponse = /* ... */;
//! let api_response: UserResponse = db_user.into();
//! ```

pub mod comments;
pub mod forum;
pub mod media;
pub mod profiles;
pub mod reviews;
pub mod users;
pub mod wallets;
