//! Comment endpoints.
//!
//! Comments work like reviews without a rating: authenticated users leave
//! them on a target user, moderation applies, and the public listing only
//! shows approved comments.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::comments::{CommentCreate, CommentResponse},
    auth::{permissions, session::AuthUser},
    db::handlers::{Comments, Repository, Users},
    db::models::comments::CommentCreateDBRequest,
    errors::Error,
    moderation::ModerationStatus,
    types::UserId,
};

/// List approved comments for a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/comments",
    params(("id" = uuid::Uuid, Path, description = "Target user id")),
    tag = "comments",
    responses(
        (status = 200, description = "Approved comments, newest first", body = Vec<CommentResponse>),
        (status = 404, description = "No such user"),
    )
)]
#[tracing::instrument(skip_all, fields(target_id = %target_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(target_id): Path<UserId>,
) -> Result<Json<Vec<CommentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    require_target_exists(&mut conn, target_id).await?;

    let comments = Comments::new(&mut conn).list_approved_for_target(target_id).await?;

    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// Leave a comment on a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/comments",
    params(("id" = uuid::Uuid, Path, description = "Target user id")),
    request_body = CommentCreate,
    tag = "comments",
    responses(
        (status = 201, description = "Created comment", body = CommentResponse),
        (status = 400, description = "Empty body"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(target_id = %target_id))]
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<UserId>,
    Json(request): Json<CommentCreate>,
) -> Result<(StatusCode, Json<CommentResponse>), Error> {
    if request.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Comment body must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    require_target_exists(&mut conn, target_id).await?;

    let status = if state.config.moderation.auto_approve_content {
        ModerationStatus::Approved
    } else {
        ModerationStatus::InReview
    };

    let comment = Comments::new(&mut conn)
        .create(&CommentCreateDBRequest {
            author_id: actor.id,
            target_id,
            body: request.body,
            status,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

async fn require_target_exists(conn: &mut sqlx::PgConnection, target_id: UserId) -> Result<(), Error> {
    Users::new(conn)
        .get_by_id(target_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: target_id.to_string(),
        })
}
