//! Article API endpoints
//!
//! Handles HTTP requests for articles:
//! - GET /api/articles - List with author/tag/favorited filters
//! - GET /api/articles/feed - Articles by followed authors
//! - GET /api/articles/{slug} - One article
//! - POST /api/articles - Create
//! - PUT /api/articles/{slug} - Update (author only)
//! - DELETE /api/articles/{slug} - Delete (author only)
//! - POST/DELETE /api/articles/{slug}/favorite - Favorite / unfavorite

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_limit, ArticleEnvelope, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::{ArticleBody, ArticlesBody};
use crate::models::{ArticleFilter, CreateArticleInput, ListParams, UpdateArticleInput};

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub author: Option<String>,
    pub tag: Option<String>,
    pub favorited: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl ListArticlesQuery {
    fn into_parts(self) -> (ArticleFilter, ListParams) {
        let params = ListParams::new(self.limit, self.offset);
        let filter = ArticleFilter {
            author: self.author,
            tag: self.tag,
            favorited: self.favorited,
        };
        (filter, params)
    }
}

/// Request body for creating an article
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

impl From<CreateArticleRequest> for CreateArticleInput {
    fn from(request: CreateArticleRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            body: request.body,
            tag_list: request.tag_list,
        }
    }
}

/// Build the public articles router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{slug}", get(get_article))
}

/// Build the protected articles router
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/articles", post(create_article))
        .route("/articles/feed", get(feed))
        .route(
            "/articles/{slug}",
            axum::routing::put(update_article).delete(delete_article),
        )
        .route(
            "/articles/{slug}/favorite",
            post(favorite_article).delete(unfavorite_article),
        )
}

/// GET /api/articles
async fn list_articles(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<ArticlesBody>, ApiError> {
    let (filter, params) = query.into_parts();
    let page = state
        .article_service
        .list(&filter, &params, viewer.principal())
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/articles/feed
async fn feed(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ArticlesBody>, ApiError> {
    let page = state
        .article_service
        .feed(&user.0, &ListParams::from(&query))
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/articles/{slug}
async fn get_article(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<ArticleBody>, ApiError> {
    let view = state.article_service.get(&slug, viewer.principal()).await?;
    Ok(Json(view.into()))
}

/// POST /api/articles
async fn create_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ArticleEnvelope<CreateArticleRequest>>,
) -> Result<(StatusCode, Json<ArticleBody>), ApiError> {
    let view = state
        .article_service
        .create(&user.0, body.article.into())
        .await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// PUT /api/articles/{slug}
async fn update_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<ArticleEnvelope<UpdateArticleInput>>,
) -> Result<Json<ArticleBody>, ApiError> {
    let view = state
        .article_service
        .update(&user.0, &slug, body.article)
        .await?;
    Ok(Json(view.into()))
}

/// DELETE /api/articles/{slug}
async fn delete_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.article_service.delete(&user.0, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/articles/{slug}/favorite
async fn favorite_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<ArticleBody>), ApiError> {
    let view = state.article_service.favorite(&user.0, &slug).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// DELETE /api/articles/{slug}/favorite
async fn unfavorite_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<ArticleBody>, ApiError> {
    let view = state.article_service.unfavorite(&user.0, &slug).await?;
    Ok(Json(view.into()))
}
