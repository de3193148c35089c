//! Forum endpoints.
//!
//! Reading is public; writing requires a session. Threads list newest first,
//! posts within a thread in reading order.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::forum::{PostCreate, PostResponse, ThreadCreate, ThreadDetailResponse, ThreadResponse},
    api::models::pagination::{PaginatedResponse, Pagination},
    auth::{permissions, session::AuthUser},
    db::handlers::Forum,
    db::models::forum::{PostCreateDBRequest, ThreadCreateDBRequest},
    errors::Error,
    types::ThreadId,
};

/// List forum threads, newest first
#[utoipa::path(
    get,
    path = "/api/v1/forum/threads",
    params(Pagination),
    tag = "forum",
    responses(
        (status = 200, description = "Threads, newest first", body = PaginatedResponse<ThreadResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_threads(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<ThreadResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let threads = Forum::new(&mut conn)
        .list_threads(pagination.skip(), pagination.limit())
        .await?;

    Ok(Json(PaginatedResponse {
        data: threads.into_iter().map(ThreadResponse::from).collect(),
        skip: pagination.skip(),
        limit: pagination.limit(),
    }))
}

/// Open a new thread
#[utoipa::path(
    post,
    path = "/api/v1/forum/threads",
    request_body = ThreadCreate,
    tag = "forum",
    responses(
        (status = 201, description = "Created thread", body = ThreadResponse),
        (status = 400, description = "Empty title or body"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ThreadCreate>,
) -> Result<(StatusCode, Json<ThreadResponse>), Error> {
    if request.title.trim().is_empty() || request.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Title and body must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let thread = Forum::new(&mut conn)
        .create_thread(&ThreadCreateDBRequest {
            author_id: actor.id,
            title: request.title,
            body: request.body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ThreadResponse::from(thread))))
}

/// Get a thread with its first page of posts
#[utoipa::path(
    get,
    path = "/api/v1/forum/threads/{id}",
    params(("id" = uuid::Uuid, Path, description = "Thread id")),
    tag = "forum",
    responses(
        (status = 200, description = "Thread with its first page of posts", body = ThreadDetailResponse),
        (status = 404, description = "No such thread"),
    )
)]
#[tracing::instrument(skip_all, fields(thread_id = %id))]
pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<ThreadId>,
) -> Result<Json<ThreadDetailResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut forum = Forum::new(&mut conn);
    let thread = forum.get_thread(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Thread".to_string(),
        id: id.to_string(),
    })?;

    // Bounded like every other listing; longer threads page through the
    // posts endpoint
    let posts = forum.list_posts(id, 0, crate::api::models::pagination::MAX_LIMIT).await?;

    Ok(Json(ThreadDetailResponse {
        thread: ThreadResponse::from(thread),
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

/// List posts in a thread, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/forum/threads/{id}/posts",
    params(("id" = uuid::Uuid, Path, description = "Thread id"), Pagination),
    tag = "forum",
    responses(
        (status = 200, description = "Posts in reading order", body = PaginatedResponse<PostResponse>),
        (status = 404, description = "No such thread"),
    )
)]
#[tracing::instrument(skip_all, fields(thread_id = %id))]
pub async fn list_posts(
    State(state): State<AppState>,
    Path(id): Path<ThreadId>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<PostResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut forum = Forum::new(&mut conn);
    forum.get_thread(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Thread".to_string(),
        id: id.to_string(),
    })?;

    let posts = forum.list_posts(id, pagination.skip(), pagination.limit()).await?;

    Ok(Json(PaginatedResponse {
        data: posts.into_iter().map(PostResponse::from).collect(),
        skip: pagination.skip(),
        limit: pagination.limit(),
    }))
}

/// Reply to a thread
#[utoipa::path(
    post,
    path = "/api/v1/forum/threads/{id}/posts",
    params(("id" = uuid::Uuid, Path, description = "Thread id")),
    request_body = PostCreate,
    tag = "forum",
    responses(
        (status = 201, description = "Created post", body = PostResponse),
        (status = 400, description = "Empty body"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such thread"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(thread_id = %id))]
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ThreadId>,
    Json(request): Json<PostCreate>,
) -> Result<(StatusCode, Json<PostResponse>), Error> {
    if request.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Post body must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let mut forum = Forum::new(&mut conn);
    forum.get_thread(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Thread".to_string(),
        id: id.to_string(),
    })?;

    let post = forum
        .create_post(&PostCreateDBRequest {
            thread_id: id,
            author_id: actor.id,
            body: request.body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, create_test_app_with_user, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_thread_lifecycle(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool.clone(), &user).await;

        let response = server
            .post("/api/v1/forum/threads")
            .json(&json!({"title": "Hello", "body": "First thread"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let thread: ThreadResponse = response.json();

        server
            .post(&format!("/api/v1/forum/threads/{}/posts", thread.id))
            .json(&json!({"body": "First reply"}))
            .await
            .assert_status(StatusCode::CREATED);

        // Reading works without a session
        let server = create_test_app(pool).await;
        let response = server.get(&format!("/api/v1/forum/threads/{}", thread.id)).await;
        response.assert_status_ok();
        let detail: ThreadDetailResponse = response.json();
        assert_eq!(detail.thread.title, "Hello");
        assert_eq!(detail.posts.len(), 1);
    }

    #[sqlx::test]
    async fn test_listing_is_paginated_newest_first(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        for i in 0..3 {
            server
                .post("/api/v1/forum/threads")
                .json(&json!({"title": format!("t{i}"), "body": "x"}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get("/api/v1/forum/threads?skip=0&limit=2").await;
        response.assert_status_ok();
        let page: PaginatedResponse<ThreadResponse> = response.json();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].title, "t2");
    }

    #[sqlx::test]
    async fn test_thread_detail_is_bounded(pool: PgPool) {
        use crate::api::models::pagination::MAX_LIMIT;
        use crate::db::handlers::Forum;
        use crate::db::models::forum::{PostCreateDBRequest, ThreadCreateDBRequest};

        let user = create_test_user(&pool, Role::User).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut forum = Forum::new(&mut conn);
        let thread = forum
            .create_thread(&ThreadCreateDBRequest {
                author_id: user.id,
                title: "Long".to_string(),
                body: "x".to_string(),
            })
            .await
            .unwrap();
        for i in 0..(MAX_LIMIT + 5) {
            forum
                .create_post(&PostCreateDBRequest {
                    thread_id: thread.id,
                    author_id: user.id,
                    body: format!("p{i}"),
                })
                .await
                .unwrap();
        }
        drop(conn);

        let server = create_test_app(pool).await;
        let response = server.get(&format!("/api/v1/forum/threads/{}", thread.id)).await;
        response.assert_status_ok();
        let detail: ThreadDetailResponse = response.json();
        assert_eq!(detail.posts.len(), MAX_LIMIT as usize);

        // The rest is reachable through the paginated posts endpoint
        let response = server
            .get(&format!("/api/v1/forum/threads/{}/posts?skip={MAX_LIMIT}&limit=10", thread.id))
            .await;
        response.assert_status_ok();
        let page: PaginatedResponse<PostResponse> = response.json();
        assert_eq!(page.data.len(), 5);
    }

    #[sqlx::test]
    async fn test_write_requires_session(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server
            .post("/api/v1/forum/threads")
            .json(&json!({"title": "x", "body": "y"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_post_to_missing_thread(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server
            .post(&format!("/api/v1/forum/threads/{}/posts", uuid::Uuid::new_v4()))
            .json(&json!({"body": "orphan"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
