use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserUpdate},
    auth::{permissions, session::AuthUser},
    db::handlers::{Repository, Users},
    errors::Error,
};

/// Get the current authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/users/current",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(State(state): State<AppState>, auth: AuthUser) -> Result<Json<CurrentUser>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    Ok(Json(CurrentUser::from(actor)))
}

/// Update the current authenticated user
#[utoipa::path(
    patch,
    path = "/api/v1/users/current",
    request_body = UserUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Updated user", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Slug already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UserUpdate>,
) -> Result<Json<CurrentUser>, Error> {
    if let Some(slug) = &request.slug {
        validate_slug(slug)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let mut user_repo = Users::new(&mut conn);
    let updated = user_repo.update(actor.id, &request.into()).await?;

    Ok(Json(CurrentUser::from(updated)))
}

/// Slugs end up in public URLs; keep them lowercase ascii with hyphens.
fn validate_slug(slug: &str) -> Result<(), Error> {
    let valid = !slug.is_empty()
        && slug.len() <= 64
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');

    if valid {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "Slug must be lowercase letters, digits and hyphens".to_string(),
        })
    }
}
