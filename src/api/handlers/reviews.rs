//! Review endpoints.
//!
//! Reviews are written by authenticated users against a target user. New
//! reviews normally enter moderation; `moderation.auto_approve_content`
//! short-circuits that for non-production environments. The public listing
//! only ever shows approved reviews.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::reviews::{ReviewCreate, ReviewResponse},
    auth::{permissions, session::AuthUser},
    db::handlers::{Repository, Reviews, Users},
    db::models::reviews::ReviewCreateDBRequest,
    errors::Error,
    moderation::ModerationStatus,
    types::UserId,
};

/// List approved reviews for a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/reviews",
    params(("id" = uuid::Uuid, Path, description = "Target user id")),
    tag = "reviews",
    responses(
        (status = 200, description = "Approved reviews, newest first", body = Vec<ReviewResponse>),
        (status = 404, description = "No such user"),
    )
)]
#[tracing::instrument(skip_all, fields(target_id = %target_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(target_id): Path<UserId>,
) -> Result<Json<Vec<ReviewResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    require_target_exists(&mut conn, target_id).await?;

    let reviews = Reviews::new(&mut conn).list_approved_for_target(target_id).await?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// Write a review about a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/reviews",
    params(("id" = uuid::Uuid, Path, description = "Target user id")),
    request_body = ReviewCreate,
    tag = "reviews",
    responses(
        (status = 201, description = "Created review", body = ReviewResponse),
        (status = 400, description = "Rating out of range or empty title/body"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(target_id = %target_id))]
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<UserId>,
    Json(request): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewResponse>), Error> {
    validate_review(&request)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    require_target_exists(&mut conn, target_id).await?;

    if actor.id == target_id {
        return Err(Error::BadRequest {
            message: "You cannot review yourself".to_string(),
        });
    }

    let status = if state.config.moderation.auto_approve_content {
        ModerationStatus::Approved
    } else {
        ModerationStatus::InReview
    };

    let review = Reviews::new(&mut conn)
        .create(&ReviewCreateDBRequest {
            author_id: actor.id,
            target_id,
            rating: request.rating,
            title: request.title,
            body: request.body,
            status,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

fn validate_review(request: &ReviewCreate) -> Result<(), Error> {
    if !(1..=5).contains(&request.rating) {
        return Err(Error::BadRequest {
            message: "Rating must be between 1 and 5".to_string(),
        });
    }
    if request.title.trim().is_empty() || request.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Title and body must not be empty".to_string(),
        });
    }
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{
        create_test_app, create_test_app_with_config_and_user, create_test_app_with_user, create_test_config,
        create_test_user,
    };
    use sqlx::PgPool;

    fn review() -> ReviewCreate {
        ReviewCreate {
            rating: 5,
            title: "Lovely".to_string(),
            body: "Great experience".to_string(),
        }
    }

    #[sqlx::test]
    async fn test_new_review_enters_moderation(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &author).await;

        let response = server
            .post(&format!("/api/v1/users/{}/reviews", target.id))
            .json(&review())
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: ReviewResponse = response.json();
        assert_eq!(body.status, ModerationStatus::InReview);

        // Not approved, so the public listing stays empty
        let listed: Vec<ReviewResponse> = server.get(&format!("/api/v1/users/{}/reviews", target.id)).await.json();
        assert!(listed.is_empty());
    }

    #[sqlx::test]
    async fn test_auto_approve_makes_reviews_public(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;

        let mut config = create_test_config();
        config.moderation.auto_approve_content = true;
        let server = create_test_app_with_config_and_user(pool, config, &author).await;

        server
            .post(&format!("/api/v1/users/{}/reviews", target.id))
            .json(&review())
            .await
            .assert_status(StatusCode::CREATED);

        let listed: Vec<ReviewResponse> = server.get(&format!("/api/v1/users/{}/reviews", target.id)).await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ModerationStatus::Approved);
    }

    #[sqlx::test]
    async fn test_rating_out_of_range_creates_nothing(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool.clone(), &author).await;

        for rating in [0, 6, -1] {
            let response = server
                .post(&format!("/api/v1/users/{}/reviews", target.id))
                .json(&ReviewCreate {
                    rating,
                    ..review()
                })
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn test_empty_title_rejected(pool: PgPool) {
        let author = create_test_user(&pool, Role::User).await;
        let target = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &author).await;

        let response = server
            .post(&format!("/api/v1/users/{}/reviews", target.id))
            .json(&ReviewCreate {
                title: "   ".to_string(),
                ..review()
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_self_review_rejected(pool: PgPool) {
        let author = create_test_user(&pool, Role::Escort).await;
        let server = create_test_app_with_user(pool, &author).await;

        let response = server
            .post(&format!("/api/v1/users/{}/reviews", author.id))
            .json(&review())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_unknown_target(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server
            .get(&format!("/api/v1/users/{}/reviews", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
