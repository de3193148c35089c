//! OpenAPI/Swagger documentation configuration.
//!
//! This module defines the OpenAPI spec for the whole REST API, served at
//! `/docs` via RapiDoc.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Security schemes: the user session token and the service key.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token issued by `POST /authentication/login`. \
                             Pass it in the `Authorization` header:\n\n\
                             ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                             Browser clients can rely on the session cookie instead.",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "service_key".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-service-key",
                    "Pre-shared service credential. Accepted only by the bulk role-management endpoint.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        // Authentication
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::request_email_verification,
        api::handlers::auth::confirm_email_verification,
        // Current account
        api::handlers::users::get_current_user,
        api::handlers::users::update_current_user,
        // Profiles
        api::handlers::profiles::get_own_profile,
        api::handlers::profiles::patch_own_profile,
        api::handlers::profiles::get_public_profile,
        api::handlers::profiles::upgrade_tier,
        // Media
        api::handlers::photos::list_photos,
        api::handlers::photos::create_photo,
        api::handlers::photos::submit_photo,
        api::handlers::photos::withdraw_photo,
        api::handlers::photos::submit_portfolio,
        api::handlers::videos::list_videos,
        api::handlers::videos::create_video,
        api::handlers::videos::submit_video,
        api::handlers::videos::withdraw_video,
        api::handlers::videos::delete_video,
        api::handlers::documents::list_documents,
        api::handlers::documents::create_document,
        api::handlers::documents::delete_document,
        // Reviews and comments
        api::handlers::reviews::list_reviews,
        api::handlers::reviews::create_review,
        api::handlers::comments::list_comments,
        api::handlers::comments::create_comment,
        // Wallet
        api::handlers::wallets::get_wallet,
        api::handlers::wallets::list_transactions,
        api::handlers::wallets::list_orders,
        api::handlers::wallets::create_purchase,
        api::handlers::wallets::capture_purchase,
        // Forum
        api::handlers::forum::list_threads,
        api::handlers::forum::create_thread,
        api::handlers::forum::get_thread,
        api::handlers::forum::list_posts,
        api::handlers::forum::create_post,
        // Admin
        api::handlers::admin::moderation_queue,
        api::handlers::admin::decide_status,
        api::handlers::admin::bulk_update_roles,
        // Webhooks
        api::handlers::payments::payment_webhook,
    ),
    components(
        schemas(
            crate::moderation::ModerationStatus,
            crate::moderation::ContentKind,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::auth::EmailVerificationConfirmRequest,
            api::models::users::Role,
            api::models::users::CurrentUser,
            api::models::users::UserUpdate,
            api::models::users::RoleAssignment,
            api::models::users::BulkRoleUpdateRequest,
            api::models::users::BulkRoleUpdateResponse,
            api::models::profiles::ProfilePatch,
            api::models::profiles::ProfileResponse,
            api::models::profiles::PublicProfileResponse,
            api::models::profiles::TierUpgradeRequest,
            api::models::media::PhotoCreate,
            api::models::media::PhotoResponse,
            api::models::media::VideoCreate,
            api::models::media::VideoResponse,
            api::models::media::DocumentCreate,
            api::models::media::DocumentResponse,
            api::models::media::BulkSubmitResponse,
            api::models::reviews::ReviewCreate,
            api::models::reviews::ReviewResponse,
            api::models::comments::CommentCreate,
            api::models::comments::CommentResponse,
            api::models::wallets::WalletResponse,
            api::models::wallets::TransactionResponse,
            api::models::wallets::OrderResponse,
            api::models::wallets::PurchaseRequest,
            api::models::wallets::PurchaseResponse,
            api::models::forum::ThreadCreate,
            api::models::forum::ThreadResponse,
            api::models::forum::ThreadDetailResponse,
            api::models::forum::PostCreate,
            api::models::forum::PostResponse,
            api::models::admin::QueueItemResponse,
            api::models::admin::StatusDecisionRequest,
            api::models::admin::StatusDecisionResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login, logout, and email verification."),
        (name = "users", description = "The authenticated account."),
        (name = "profiles", description = "Escort and agency profiles: owner edits, public reads, tier upgrades."),
        (name = "photos", description = "Portfolio photos and their moderation lifecycle."),
        (name = "videos", description = "Portfolio videos and their moderation lifecycle."),
        (name = "documents", description = "Verification documents."),
        (name = "reviews", description = "Reviews left on profiles."),
        (name = "comments", description = "Comments left on profiles."),
        (name = "wallet", description = "Credit balance, ledger history, and credit purchases."),
        (name = "forum", description = "Community threads and posts."),
        (name = "admin", description = "Moderation queues, status decisions, and role management."),
        (name = "webhooks", description = "Callbacks from external services."),
    ),
    info(
        title = "vitrine API",
        version = "1.0.0",
        description = "REST API for the vitrine escort directory.

## Authentication

Most endpoints require a session token from `POST /authentication/login`, passed either as
`Authorization: Bearer YOUR_TOKEN` or in the session cookie the login response sets.

## Moderation

User-generated content moves through `draft` → `in_review` → `approved`/`rejected`.
Only approved content appears on public profiles.",
    ),
)]
pub struct ApiDoc;
