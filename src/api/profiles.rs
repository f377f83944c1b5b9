//! Profile API endpoints
//!
//! - GET /api/profiles/{username} - Profile as seen by the caller
//! - POST /api/profiles/{username}/follow - Follow
//! - DELETE /api/profiles/{username}/follow - Unfollow

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::ProfileBody;

pub fn public_router() -> Router<AppState> {
    Router::new().route("/profiles/{username}", get(get_profile))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route(
        "/profiles/{username}/follow",
        post(follow_profile).delete(unfollow_profile),
    )
}

/// GET /api/profiles/{username}
async fn get_profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileBody>, ApiError> {
    let view = state
        .profile_service
        .get(&username, viewer.principal())
        .await?;
    Ok(Json(view.into()))
}

/// POST /api/profiles/{username}/follow
async fn follow_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileBody>, ApiError> {
    let view = state.profile_service.follow(&user.0, &username).await?;
    Ok(Json(view.into()))
}

/// DELETE /api/profiles/{username}/follow
async fn unfollow_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileBody>, ApiError> {
    let view = state.profile_service.unfollow(&user.0, &username).await?;
    Ok(Json(view.into()))
}
