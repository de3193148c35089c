//! Photo endpoints.
//!
//! Photos are the moderated portfolio: owners upload drafts, submit them for
//! review (individually or as a bulk portfolio submission), and withdraw them
//! while a decision is pending. Photos are never deleted through the API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::media::{BulkSubmitResponse, PhotoCreate, PhotoResponse},
    api::models::users::Role,
    auth::{permissions, session::AuthUser},
    db::handlers::Photos,
    db::models::media::PhotoCreateDBRequest,
    errors::Error,
    moderation::ModerationStatus,
    types::PhotoId,
};

/// A portfolio must hold at least this many photos before bulk submission.
pub const MIN_PORTFOLIO_PHOTOS: i64 = 3;

/// List the caller's own photos
#[utoipa::path(
    get,
    path = "/api/v1/photos",
    tag = "photos",
    responses(
        (status = 200, description = "Photos, newest first", body = Vec<PhotoResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_photos(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<PhotoResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let photos = Photos::new(&mut conn).list_for_user(actor.id).await?;

    Ok(Json(photos.into_iter().map(PhotoResponse::from).collect()))
}

/// Upload a photo (created as draft)
#[utoipa::path(
    post,
    path = "/api/v1/photos",
    request_body = PhotoCreate,
    tag = "photos",
    responses(
        (status = 201, description = "Created photo", body = PhotoResponse),
        (status = 400, description = "Invalid URL"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<PhotoCreate>,
) -> Result<(StatusCode, Json<PhotoResponse>), Error> {
    validate_media_url(&request.url)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency])?;

    let photo = Photos::new(&mut conn)
        .create(&PhotoCreateDBRequest {
            user_id: actor.id,
            url: request.url,
            is_face: request.is_face,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PhotoResponse::from(photo))))
}

/// Submit a draft photo for review
#[utoipa::path(
    post,
    path = "/api/v1/photos/{id}/submit",
    params(("id" = uuid::Uuid, Path, description = "Photo id")),
    tag = "photos",
    responses(
        (status = 200, description = "Photo now in review", body = PhotoResponse),
        (status = 400, description = "Photo is not a draft"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such photo"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(photo_id = %id))]
pub async fn submit_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PhotoId>,
) -> Result<Json<PhotoResponse>, Error> {
    transition_photo(&state, &auth, id, ModerationStatus::Draft, ModerationStatus::InReview).await
}

/// Withdraw a photo from review back to draft
#[utoipa::path(
    post,
    path = "/api/v1/photos/{id}/withdraw",
    params(("id" = uuid::Uuid, Path, description = "Photo id")),
    tag = "photos",
    responses(
        (status = 200, description = "Photo back in draft", body = PhotoResponse),
        (status = 400, description = "Photo is not in review"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such photo"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(photo_id = %id))]
pub async fn withdraw_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PhotoId>,
) -> Result<Json<PhotoResponse>, Error> {
    transition_photo(&state, &auth, id, ModerationStatus::InReview, ModerationStatus::Draft).await
}

/// Submit the whole draft portfolio for review in one shot.
///
/// All drafts move together or none do; the minimum-size and face-shot
/// preconditions are checked in the same transaction as the update.
#[utoipa::path(
    post,
    path = "/api/v1/photos/submissions",
    tag = "photos",
    responses(
        (status = 200, description = "Drafts moved to review", body = BulkSubmitResponse),
        (status = 400, description = "Portfolio does not meet the submission requirements"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn submit_portfolio(State(state): State<AppState>, auth: AuthUser) -> Result<Json<BulkSubmitResponse>, Error> {
    let actor = permissions::load_actor_from_state(&state, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency])?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let moved = Photos::new(&mut tx)
        .submit_all_drafts(actor.id, MIN_PORTFOLIO_PHOTOS)
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    match moved {
        Some(submitted) => Ok(Json(BulkSubmitResponse { submitted })),
        None => Err(Error::BadRequest {
            message: format!(
                "A portfolio needs at least {MIN_PORTFOLIO_PHOTOS} photos including one face photo before submission"
            ),
        }),
    }
}

/// Owner-conditional transition. A miss is disambiguated by re-reading:
/// photos that exist but belong to someone else still report 404.
async fn transition_photo(
    state: &AppState,
    auth: &AuthUser,
    id: PhotoId,
    from: ModerationStatus,
    to: ModerationStatus,
) -> Result<Json<PhotoResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, auth).await?;

    let mut photos = Photos::new(&mut conn);
    if let Some(photo) = photos.update_status(id, actor.id, from, to).await? {
        return Ok(Json(PhotoResponse::from(photo)));
    }

    match photos.get_by_id(id).await? {
        Some(photo) if photo.user_id == actor.id => Err(Error::BadRequest {
            message: format!("Photo is {}, expected {from}", photo.status),
        }),
        _ => Err(Error::NotFound {
            resource: "Photo".to_string(),
            id: id.to_string(),
        }),
    }
}

pub(super) fn validate_media_url(url: &str) -> Result<(), Error> {
    let parsed = url::Url::parse(url).map_err(|_| Error::BadRequest {
        message: "Invalid URL".to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::BadRequest {
            message: "URL must use http or https".to_string(),
        });
    }
    Ok(())
}
