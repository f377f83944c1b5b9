//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Users and authentication
//! - Profiles and follows
//! - Articles, favorites and the feed
//! - Comments
//! - Tags

pub mod articles;
pub mod auth;
pub mod comments;
pub mod common;
pub mod middleware;
pub mod profiles;
pub mod responses;
pub mod tags;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};

/// Build the `/api` router
pub fn build_api_router() -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(profiles::protected_router())
        .merge(articles::protected_router())
        .merge(comments::protected_router())
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    // Public routes (token optional)
    Router::new()
        .merge(auth::public_router())
        .merge(profiles::public_router())
        .merge(articles::public_router())
        .merge(comments::public_router())
        .merge(tags::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
///
/// `cors_origin` is either `*` or a single allowed origin.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = if cors_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
        AllowOrigin::exact(value)
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .nest("/api", build_api_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
