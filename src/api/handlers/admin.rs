//! Admin surface: moderation queues, status decisions, and bulk role
//! management.
//!
//! Everything here requires the admin role; the bulk role endpoint
//! additionally accepts the pre-shared service key so a back-office system
//! can manage roles without a user session.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::{
    AppState,
    api::models::admin::{QueueItemResponse, StatusDecisionRequest, StatusDecisionResponse},
    api::models::pagination::{PaginatedResponse, Pagination},
    api::models::users::{BulkRoleUpdateRequest, BulkRoleUpdateResponse},
    auth::{current_user, permissions, session::AuthUser},
    db::handlers::{Moderation, Users},
    errors::Error,
    moderation::ContentKind,
};
use uuid::Uuid;

/// List content awaiting review for one kind, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/moderation/{kind}",
    params(("kind" = ContentKind, Path, description = "Content kind"), Pagination),
    tag = "admin",
    responses(
        (status = 200, description = "Items awaiting review, oldest first", body = PaginatedResponse<QueueItemResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(kind = ?kind))]
pub async fn moderation_queue(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(kind): Path<ContentKind>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<QueueItemResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_admin(&actor)?;

    let items = Moderation::new(&mut conn)
        .queue(kind, pagination.skip(), pagination.limit())
        .await?;

    Ok(Json(PaginatedResponse {
        data: items.into_iter().map(QueueItemResponse::from).collect(),
        skip: pagination.skip(),
        limit: pagination.limit(),
    }))
}

/// Decide the moderation status of a piece of content.
///
/// Admins may set any status from any status, including resetting terminal
/// decisions.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/{kind}/{id}/status",
    params(
        ("kind" = ContentKind, Path, description = "Content kind"),
        ("id" = uuid::Uuid, Path, description = "Content id"),
    ),
    request_body = StatusDecisionRequest,
    tag = "admin",
    responses(
        (status = 200, description = "Status applied", body = StatusDecisionResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "No such item"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(kind = ?kind, id = %id))]
pub async fn decide_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((kind, id)): Path<(ContentKind, Uuid)>,
    Json(request): Json<StatusDecisionRequest>,
) -> Result<Json<StatusDecisionResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_admin(&actor)?;

    let changed = Moderation::new(&mut conn).decide(kind, id, request.status).await?;
    if !changed {
        return Err(Error::NotFound {
            resource: format!("{kind:?}"),
            id: id.to_string(),
        });
    }

    Ok(Json(StatusDecisionResponse {
        id,
        status: request.status,
    }))
}

/// Bulk role assignment.
///
/// Accepts either an admin session or the `X-Service-Key` header, so role
/// sync can run as a service-to-service call. Unknown users are reported
/// back instead of failing the batch.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/roles",
    request_body = BulkRoleUpdateRequest,
    tag = "admin",
    responses(
        (status = 200, description = "Roles applied", body = BulkRoleUpdateResponse),
        (status = 401, description = "No valid credential"),
        (status = 403, description = "Session user is not an admin"),
    ),
    security(("session_token" = []), ("service_key" = []))
)]
#[tracing::instrument(skip_all, fields(assignments = request.assignments.len()))]
pub async fn bulk_update_roles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BulkRoleUpdateRequest>,
) -> Result<Json<BulkRoleUpdateResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // A present service key header is authoritative: no fallback to session
    // auth on mismatch
    if headers.contains_key("x-service-key") {
        permissions::verify_service_key(&headers, &state.config)?;
    } else {
        let auth = current_user::authenticate_headers(&headers, &state.config)?;
        let actor = permissions::load_actor(&mut conn, &auth).await?;
        permissions::require_admin(&actor)?;
    }

    let mut users = Users::new(&mut conn);
    let mut updated = 0;
    let mut missing = Vec::new();
    for assignment in &request.assignments {
        if users.set_role(assignment.user_id, assignment.role).await? {
            updated += 1;
        } else {
            missing.push(assignment.user_id);
        }
    }

    Ok(Json(BulkRoleUpdateResponse { updated, missing }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::{Role, RoleAssignment};
    use crate::moderation::ModerationStatus;
    use crate::test_utils::{
        create_test_app_with_config_and_user, create_test_app_with_user, create_test_config, create_test_user,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    async fn photo_in_review(pool: &PgPool, owner: &crate::db::models::users::UserDBResponse) -> Uuid {
        let mut conn = pool.acquire().await.unwrap();
        let photo = crate::db::handlers::Photos::new(&mut conn)
            .create(&crate::db::models::media::PhotoCreateDBRequest {
                user_id: owner.id,
                url: "https://cdn.example.com/p.jpg".to_string(),
                is_face: true,
            })
            .await
            .unwrap();
        crate::db::handlers::Photos::new(&mut conn)
            .update_status(photo.id, owner.id, ModerationStatus::Draft, ModerationStatus::InReview)
            .await
            .unwrap();
        photo.id
    }

    #[sqlx::test]
    async fn test_queue_and_decision(pool: PgPool) {
        let escort = create_test_user(&pool, Role::Escort).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let photo_id = photo_in_review(&pool, &escort).await;

        let server = create_test_app_with_user(pool, &admin).await;

        let response = server.get("/api/v1/admin/moderation/photos").await;
        response.assert_status_ok();
        let page: PaginatedResponse<QueueItemResponse> = response.json();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, photo_id);

        let response = server
            .patch(&format!("/api/v1/admin/photos/{photo_id}/status"))
            .json(&StatusDecisionRequest {
                status: ModerationStatus::Approved,
            })
            .await;
        response.assert_status_ok();

        // Approved items leave the queue
        let page: PaginatedResponse<QueueItemResponse> = server.get("/api/v1/admin/moderation/photos").await.json();
        assert!(page.data.is_empty());
    }

    #[sqlx::test]
    async fn test_decision_on_missing_item(pool: PgPool) {
        let admin = create_test_user(&pool, Role::Admin).await;
        let server = create_test_app_with_user(pool, &admin).await;

        let response = server
            .patch(&format!("/api/v1/admin/reviews/{}/status", Uuid::new_v4()))
            .json(&StatusDecisionRequest {
                status: ModerationStatus::Rejected,
            })
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_non_admin_rejected(pool: PgPool) {
        let escort = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &escort).await;

        let response = server.get("/api/v1/admin/moderation/photos").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_bulk_roles_with_admin_session(pool: PgPool) {
        let admin = create_test_user(&pool, Role::Admin).await;
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &admin).await;

        let response = server
            .post("/api/v1/admin/users/roles")
            .json(&BulkRoleUpdateRequest {
                assignments: vec![
                    RoleAssignment {
                        user_id: user.id,
                        role: Role::Escort,
                    },
                    RoleAssignment {
                        user_id: Uuid::new_v4(),
                        role: Role::Agency,
                    },
                ],
            })
            .await;
        response.assert_status_ok();

        let body: BulkRoleUpdateResponse = response.json();
        assert_eq!(body.updated, 1);
        assert_eq!(body.missing.len(), 1);
    }

    #[sqlx::test]
    async fn test_bulk_roles_with_service_key(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;

        let mut config = create_test_config();
        config.auth.service_key = Some("svc-key-0123456789abcdef".to_string());
        let server = create_test_app_with_config_and_user(pool.clone(), config, &user).await;

        let body = json!({"assignments": [{"user_id": user.id, "role": "escort"}]});

        // Without the key, the plain user session is not enough
        let response = server.post("/api/v1/admin/users/roles").json(&body).await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/api/v1/admin/users/roles")
            .add_header("x-service-key", "svc-key-0123456789abcdef")
            .json(&body)
            .await;
        response.assert_status_ok();

        let mut conn = pool.acquire().await.unwrap();
        let updated = crate::db::handlers::Users::new(&mut conn)
            .get_user_by_email(&user.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Escort);

        // A wrong key never falls back to session auth
        let response = server
            .post("/api/v1/admin/users/roles")
            .add_header("x-service-key", "wrong-key")
            .json(&body)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
