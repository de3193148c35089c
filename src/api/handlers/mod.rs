//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`admin`]: Moderation queues, status decisions, bulk role management
//! - [`auth`]: Registration, login, logout, email verification
//! - [`comments`]: Comments on escort and agency profiles
//! - [`documents`]: Verification document uploads
//! - [`forum`]: Community threads and posts
//! - [`payments`]: Payment provider webhook intake
//! - [`photos`]: Portfolio photo uploads and moderation submissions
//! - [`profiles`]: Own-profile editing, public profile reads, tier upgrades
//! - [`reviews`]: Reviews on escort and agency profiles
//! - [`users`]: Current-account reads and updates
//! - [`videos`]: Portfolio video uploads and moderation submissions
//! - [`wallets`]: Balance, ledger history, credit purchases
//!
//! # Authentication
//!
//! Most handlers require a session token, passed either as a Bearer header
//! or in the session cookie. The extractor lives in
//! [`crate::auth::current_user`]; role checks happen inside the handlers via
//! [`crate::auth::permissions`] so that role changes apply immediately.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod admin;
pub mod auth;
pub mod comments;
pub mod documents;
pub mod forum;
pub mod payments;
pub mod photos;
pub mod profiles;
pub mod reviews;
pub mod users;
pub mod videos;
pub mod wallets;
