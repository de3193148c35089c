//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Models use serde for deserialization and validation
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! - [`auth`]: Registration, login, and email verification payloads
//! - [`users`]: Current-user views, roles, bulk role management
//! - [`profiles`]: Profile patches, owner and public profile views
//! - [`media`]: Photos, videos, documents
//! - [`reviews`], [`comments`]: User-generated content on profiles
//! - [`wallets`]: Wallet, ledger, and purchase payloads
//! - [`forum`]: Threads and posts
//! - [`admin`]: Moderation queues and status decisions
//! - [`pagination`]: Shared `skip`/`limit` query parameters
//!
//! # Example
//!
//! ```ignore
//! use vitrine::api::models::reviews::{ReviewCreate, ReviewResponse};
//!
//! // Deserialize from JSON
//! let create_req: ReviewCreate = serde_json::from_str(json_str)?;
//!
//! // Serialize to JSON
//! let response = ReviewResponse { /* ... */ };
//! let json = serde_json::to_string(&response)?;
//! ```

pub mod admin;
pub mod auth;
pub mod comments;
pub mod forum;
pub mod media;
pub mod pagination;
pub mod profiles;
pub mod reviews;
pub mod users;
pub mod wallets;
