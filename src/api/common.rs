//! Common API utilities and shared types
//!
//! Request envelopes and query types used by more than one endpoint.

use serde::Deserialize;

use crate::models::ListParams;

// ============================================================================
// Pagination
// ============================================================================

pub fn default_limit() -> i64 {
    20
}

/// `limit`/`offset` query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl From<&PaginationQuery> for ListParams {
    fn from(query: &PaginationQuery) -> Self {
        ListParams::new(query.limit, query.offset)
    }
}

// ============================================================================
// Request envelopes
// ============================================================================

/// `{"user": {...}}`
#[derive(Debug, Deserialize)]
pub struct UserEnvelope<T> {
    pub user: T,
}

/// `{"article": {...}}`
#[derive(Debug, Deserialize)]
pub struct ArticleEnvelope<T> {
    pub article: T,
}

/// `{"comment": {...}}`
#[derive(Debug, Deserialize)]
pub struct CommentEnvelope<T> {
    pub comment: T,
}
