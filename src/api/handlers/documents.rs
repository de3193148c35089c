//! Verification document endpoints.
//!
//! Documents go straight into review on upload. They can be deleted by their
//! owner except while a moderator decision is pending.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::media::{DocumentCreate, DocumentResponse},
    api::models::users::Role,
    auth::{permissions, session::AuthUser},
    db::handlers::Documents,
    db::models::media::DocumentCreateDBRequest,
    errors::Error,
    moderation::ModerationStatus,
    types::DocumentId,
};

use super::photos::validate_media_url;

const DOCUMENT_KINDS: &[&str] = &["id_card", "passport", "proof_of_age"];

/// List the caller's own documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    responses(
        (status = 200, description = "Documents, newest first", body = Vec<DocumentResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_documents(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<DocumentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let documents = Documents::new(&mut conn).list_for_user(actor.id).await?;

    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

/// Upload a verification document (enters review immediately)
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = DocumentCreate,
    tag = "documents",
    responses(
        (status = 201, description = "Created document", body = DocumentResponse),
        (status = 400, description = "Invalid URL or document kind"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an escort account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<DocumentCreate>,
) -> Result<(StatusCode, Json<DocumentResponse>), Error> {
    validate_media_url(&request.url)?;
    if !DOCUMENT_KINDS.contains(&request.kind.as_str()) {
        return Err(Error::BadRequest {
            message: format!("Unknown document kind '{}'", request.kind),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;
    permissions::require_role(&actor, &[Role::Escort, Role::Agency])?;

    let document = Documents::new(&mut conn)
        .create(&DocumentCreateDBRequest {
            user_id: actor.id,
            url: request.url,
            kind: request.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// Delete an owned document, unless it is under review
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = uuid::Uuid, Path, description = "Document id")),
    tag = "documents",
    responses(
        (status = 200, description = "Document deleted"),
        (status = 400, description = "Document is under review"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such document"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(document_id = %id))]
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let mut documents = Documents::new(&mut conn);
    if documents.delete_owned(id, actor.id).await? {
        return Ok(StatusCode::OK);
    }

    // The delete refuses rows under review; everything else is a 404,
    // including documents owned by somebody else
    match documents.get_by_id(id).await? {
        Some(document) if document.user_id == actor.id && document.status == ModerationStatus::InReview => {
            Err(Error::BadRequest {
                message: "Document is under review and cannot be deleted".to_string(),
            })
        }
        _ => Err(Error::NotFound {
            resource: "Document".to_string(),
            id: id.to_string(),
        }),
    }
}
