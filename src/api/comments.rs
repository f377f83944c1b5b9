//! Comment API endpoints
//!
//! - GET /api/articles/{slug}/comments - Comments, oldest first
//! - POST /api/articles/{slug}/comments - Add a comment
//! - DELETE /api/articles/{slug}/comments/{id} - Delete own comment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::CommentEnvelope;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::{CommentBody, CommentsBody};

/// Request body for creating a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub body: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/articles/{slug}/comments", get(list_comments))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/articles/{slug}/comments", post(create_comment))
        .route("/articles/{slug}/comments/{id}", delete(delete_comment))
}

/// GET /api/articles/{slug}/comments
async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<CommentsBody>, ApiError> {
    let comments = state
        .comment_service
        .list(&slug, viewer.principal())
        .await?;
    Ok(Json(CommentsBody {
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/articles/{slug}/comments
async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<CommentEnvelope<CreateCommentRequest>>,
) -> Result<(StatusCode, Json<CommentBody>), ApiError> {
    let view = state
        .comment_service
        .create(&user.0, &slug, &body.comment.body)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentBody { comment: view.into() })))
}

/// DELETE /api/articles/{slug}/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(&user.0, &slug, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
