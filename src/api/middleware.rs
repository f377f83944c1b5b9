//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The `ApiError` envelope and its mapping from [`ServiceError`]
//! - Token authentication (`Authorization: Token <jwt>` or `Bearer <jwt>`)
//! - Extractors for required and optional principals

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::db::repositories::{
    SqlxArticleRepository, SqlxCommentRepository, SqlxProfileRepository, SqlxTagRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    ArticleService, CommentService, Principal, ProfileService, ServiceError, TagService,
    TokenService, UserService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub profile_service: Arc<ProfileService>,
    pub article_service: Arc<ArticleService>,
    pub comment_service: Arc<CommentService>,
    pub tag_service: Arc<TagService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DynDatabasePool, tokens: TokenService) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let profile_repo = SqlxProfileRepository::boxed(pool.clone());
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let tag_repo = SqlxTagRepository::boxed(pool);

        let tag_service = Arc::new(TagService::new(tag_repo));
        Self {
            user_service: Arc::new(UserService::new(user_repo, profile_repo.clone(), tokens)),
            profile_service: Arc::new(ProfileService::new(profile_repo.clone())),
            article_service: Arc::new(ArticleService::new(
                article_repo.clone(),
                profile_repo.clone(),
                tag_service.clone(),
            )),
            comment_service: Arc::new(CommentService::new(comment_repo, article_repo, profile_repo)),
            tag_service,
        }
    }
}

/// Principal of an authenticated request; rejects with 401 when absent
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

/// Principal of a request that may be anonymous
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

impl MaybeUser {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" | "INVALID_CREDENTIALS" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::UNPROCESSABLE_ENTITY,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::validation_error(msg),
            ServiceError::InvalidCredentials => {
                ApiError::new("INVALID_CREDENTIALS", ServiceError::InvalidCredentials.to_string())
            }
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the token from the Authorization header.
///
/// `Ok(None)` when the header is absent, `Err` when it is present but
/// not of the form `Token <jwt>` or `Bearer <jwt>`.
fn extract_token(request: &Request) -> Result<Option<String>, ApiError> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authorization header."))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") =>
        {
            Ok(Some(token.to_string()))
        }
        _ => Err(ApiError::unauthorized(
            "Invalid authorization header. Expected 'Token <jwt>'.",
        )),
    }
}

/// Authentication middleware
///
/// Resolves a presented token and stores the principal in the request
/// extensions. Requests without a token pass through anonymously; a token
/// that does not verify is rejected even on public routes.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&request)? {
        let principal = state.user_service.resolve_token(&token).await?;
        request.extensions_mut().insert(AuthenticatedUser(principal));
    }
    Ok(next.run(request).await)
}

/// Reject anonymous requests
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return Err(ApiError::unauthorized(
            "Authentication credentials were not provided.",
        ));
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0.clone()),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
