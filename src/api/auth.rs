//! Authentication API endpoints
//!
//! - POST /api/users - Registration
//! - POST /api/users/login - Login
//! - GET /api/user - Current user
//! - PUT /api/user - Update current user

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::UserEnvelope;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserBody;
use crate::models::UpdateAccountInput;
use crate::services::{LoginInput, RegisterInput};

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Routes open to anonymous clients
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
}

/// Routes that require a token
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/user", get(current_user).put(update_user))
}

/// POST /api/users
async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserEnvelope<RegisterRequest>>,
) -> Result<(StatusCode, Json<UserBody>), ApiError> {
    let request = body.user;
    let signed_in = state
        .user_service
        .register(RegisterInput::new(request.username, request.email, request.password))
        .await?;

    Ok((StatusCode::CREATED, Json(signed_in.into())))
}

/// POST /api/users/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<UserEnvelope<LoginRequest>>,
) -> Result<Json<UserBody>, ApiError> {
    let request = body.user;
    let signed_in = state
        .user_service
        .login(LoginInput::new(request.email, request.password))
        .await?;

    Ok(Json(signed_in.into()))
}

/// GET /api/user
async fn current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserBody>, ApiError> {
    let signed_in = state.user_service.current_with_token(user.0.user_id).await?;
    Ok(Json(signed_in.into()))
}

/// PUT /api/user
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UserEnvelope<UpdateAccountInput>>,
) -> Result<Json<UserBody>, ApiError> {
    let signed_in = state.user_service.update(user.0.user_id, body.user).await?;
    Ok(Json(signed_in.into()))
}
