//! Tag API endpoints
//!
//! - GET /api/tags - All tag names

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::TagsBody;

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new().route("/tags", get(list_tags))
}

/// GET /api/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<TagsBody>, ApiError> {
    let tags = state.tag_service.list().await?;
    Ok(Json(TagsBody { tags }))
}
