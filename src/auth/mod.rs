//! Authentication and authorization system.
//!
//! # Authentication Methods
//!
//! The system accepts the same signed session token from two places:
//!
//! ## 1. Bearer token
//!
//! `Authorization: Bearer <token>` - used by API clients. Checked first;
//! when both credentials are present, the header wins.
//!
//! ## 2. Session cookie
//!
//! Browser-based authentication using a secure HTTP-only cookie set on
//! login/registration. Cookie name and flags come from
//! `auth.native.session` configuration.
//!
//! A third, separate credential exists for service-to-service calls: the
//! `X-Service-Key` header, compared in constant time against
//! `auth.service_key`. It is accepted only by the bulk role-management
//! endpoint and never identifies a user.
//!
//! # Authorization
//!
//! Access control is managed through:
//! - **Roles**: a single role per user (`user`, `escort`, `agency`, `admin`),
//!   loaded from the database at gate time so role changes apply immediately
//! - **Ownership**: users can modify their own resources; ownership
//!   mismatches on mutation are reported as 404, not 403
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated identity ([`session::AuthUser`])
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Actor loading, role checks, and the service key check
//! - [`session`]: Session and email verification token issue/verify
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use vitrine::auth::{permissions, session::AuthUser};
//! use axum::extract::State;
//!
//! async fn protected_handler(
//!     State(state): State<AppState>,
//!     auth: AuthUser,
//! ) -> Result<String> {
//!     let mut conn = state.db.acquire().await.map_err(DbError::from)?;
//!     let actor = permissions::load_actor(&mut conn, &auth).await?;
//!     permissions::require_admin(&actor)?;
//!     Ok(format!("Hello, {}!", actor.email))
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
