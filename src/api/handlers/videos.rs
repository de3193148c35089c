//! Video endpoints.
//!
//! Videos follow the same owner submit/withdraw flow as photos, but unlike
//! photos they can be deleted by their owner in any moderation state.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::media::{VideoCreate, VideoResponse},
    api::models::users::Role,
    auth::{permissions, session::AuthUser},
    db::handlers::Videos,
    db::models::media::VideoCreateDBRequest,
    errors::Error,
    moderation::ModerationStatus,
    types::VideoId,
};

use super::photos::validate_media_url;

/// List the caller's own videos
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Videos, newest first", body = Vec<VideoResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_videos(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<VideoResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let videos = Videos::new(&mut conn).list_for_user(actor.id).await?;

    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

/// Upload a video (created as draft)
#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body = VideoCreate,
    tag = "videos",
    responses(
        (status = 201, description = "Created video", body = VideoResponse),
        (status = 400, description = "Invalid URL"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<VideoCreate>,
) -> Result<(StatusCode, Json<VideoResponse>), Error> {
    validate_media_url(&request.url)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency])?;

    let video = Videos::new(&mut conn)
        .create(&VideoCreateDBRequest {
            user_id: actor.id,
            url: request.url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(video))))
}

/// Submit a draft video for review
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/submit",
    params(("id" = uuid::Uuid, Path, description = "Video id")),
    tag = "videos",
    responses(
        (status = 200, description = "Video now in review", body = VideoResponse),
        (status = 400, description = "Video is not a draft"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such video"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(video_id = %id))]
pub async fn submit_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<VideoId>,
) -> Result<Json<VideoResponse>, Error> {
    transition_video(&state, &auth, id, ModerationStatus::Draft, ModerationStatus::InReview).await
}

/// Withdraw a video from review back to draft
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/withdraw",
    params(("id" = uuid::Uuid, Path, description = "Video id")),
    tag = "videos",
    responses(
        (status = 200, description = "Video back in draft", body = VideoResponse),
        (status = 400, description = "Video is not in review"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such video"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(video_id = %id))]
pub async fn withdraw_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<VideoId>,
) -> Result<Json<VideoResponse>, Error> {
    transition_video(&state, &auth, id, ModerationStatus::InReview, ModerationStatus::Draft).await
}

/// Delete an owned video, regardless of moderation state
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    params(("id" = uuid::Uuid, Path, description = "Video id")),
    tag = "videos",
    responses(
        (status = 200, description = "Video deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such video"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(video_id = %id))]
pub async fn delete_video(State(state): State<AppState>, auth: AuthUser, Path(id): Path<VideoId>) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    if Videos::new(&mut conn).delete_owned(id, actor.id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(Error::NotFound {
            resource: "Video".to_string(),
            id: id.to_string(),
        })
    }
}

async fn transition_video(
    state: &AppState,
    auth: &AuthUser,
    id: VideoId,
    from: ModerationStatus,
    to: ModerationStatus,
) -> Result<Json<VideoResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, auth).await?;

    let mut videos = Videos::new(&mut conn);
    if let Some(video) = videos.update_status(id, actor.id, from, to).await? {
        return Ok(Json(VideoResponse::from(video)));
    }

    match videos.get_by_id(id).await? {
        Some(video) if video.user_id == actor.id => Err(Error::BadRequest {
            message: format!("Video is {}, expected {from}", video.status),
        }),
        _ => Err(Error::NotFound {
            resource: "Video".to_string(),
            id: id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app_with_user, create_test_user};
    use sqlx::PgPool;

    async fn upload(server: &axum_test::TestServer) -> VideoResponse {
        let response = server
            .post("/api/v1/videos")
            .json(&VideoCreate {
                url: "https://cdn.example.com/v.mp4".to_string(),
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    async fn test_upload_submit_withdraw(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        let video = upload(&server).await;
        assert_eq!(video.status, ModerationStatus::Draft);

        let response = server.post(&format!("/api/v1/videos/{}/submit", video.id)).await;
        response.assert_status_ok();

        let response = server.post(&format!("/api/v1/videos/{}/withdraw", video.id)).await;
        response.assert_status_ok();
        let withdrawn: VideoResponse = response.json();
        assert_eq!(withdrawn.status, ModerationStatus::Draft);
    }

    #[sqlx::test]
    async fn test_delete_while_in_review(pool: PgPool) {
        let user = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &user).await;

        let video = upload(&server).await;
        server
            .post(&format!("/api/v1/videos/{}/submit", video.id))
            .await
            .assert_status_ok();

        // Videos, unlike photos and documents, can go at any time
        let response = server.delete(&format!("/api/v1/videos/{}", video.id)).await;
        response.assert_status_ok();

        let videos: Vec<VideoResponse> = server.get("/api/v1/videos").await.json();
        assert!(videos.is_empty());
    }

    #[sqlx::test]
    async fn test_delete_foreign_video_reports_not_found(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Escort).await;
        let other = create_test_user(&pool, Role::Escort).await;

        let server = create_test_app_with_user(pool.clone(), &owner).await;
        let video = upload(&server).await;

        let server = create_test_app_with_user(pool.clone(), &other).await;
        let response = server.delete(&format!("/api/v1/videos/{}", video.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);

        // Still there for the owner
        let server = create_test_app_with_user(pool, &owner).await;
        let videos: Vec<VideoResponse> = server.get("/api/v1/videos").await.json();
        assert_eq!(videos.len(), 1);
    }
}
