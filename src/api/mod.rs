//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into several functional areas:
//!
//! - **Authentication** (`/authentication/*`): Registration, login, logout,
//!   email verification
//! - **Users & profiles** (`/api/v1/users/*`, `/api/v1/profile*`): Account
//!   and profile management, public profile reads
//! - **Media** (`/api/v1/photos|videos|documents/*`): Uploads and moderation
//!   submissions
//! - **Reviews & comments** (`/api/v1/users/{id}/reviews|comments`)
//! - **Wallet** (`/api/v1/wallet/*`): Balance, ledger, credit purchases
//! - **Forum** (`/api/v1/forum/*`): Threads and posts
//! - **Admin** (`/api/v1/admin/*`): Moderation queues, status decisions,
//!   bulk role management
//! - **Webhooks** (`/webhooks/payments`): Payment provider callbacks
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI/Swagger annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
