//! Article model
//!
//! Articles, the inputs used to create and edit them, list filters and
//! pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProfileView;

/// Maximum length of an article slug (and title) in characters
pub const MAX_SLUG_LENGTH: usize = 255;

/// Article entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly identifier, unique and fixed at creation
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    /// Authoring profile ID
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; the slug has already been generated.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i64,
}

/// Input for creating an article
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub description: String,
    pub body: String,
    /// Tag names; created on first use
    pub tag_list: Vec<String>,
}

/// Input for editing an article. The slug is never changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

/// Conjunctive list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    /// Author username
    pub author: Option<String>,
    /// Tag slug
    pub tag: Option<String>,
    /// Username of a profile that favorited the article
    pub favorited: Option<String>,
}

/// Limit/offset pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    /// Number of items to return
    pub limit: i64,
    /// Number of items to skip
    pub offset: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters; limit is clamped to 1..=100
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, 100),
            offset: offset.max(0),
        }
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current window
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    /// Convert items while keeping the total
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// An article as presented to a particular viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    pub author: ProfileView,
    /// Tag names, alphabetical
    pub tag_list: Vec<String>,
    pub favorited: bool,
    pub favorites_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_default() {
        let params = ListParams::default();
        assert_eq!(params.limit, 20);
        assert_eq!(params.offset, 0);
    }

    #[test]
    fn test_list_params_clamps() {
        assert_eq!(ListParams::new(0, 0).limit, 1);
        assert_eq!(ListParams::new(500, 0).limit, 100);
        assert_eq!(ListParams::new(10, -5).offset, 0);
        assert_eq!(ListParams::new(10, 30), ListParams { limit: 10, offset: 30 });
    }

    #[test]
    fn test_paged_result_map_keeps_total() {
        let page = PagedResult::new(vec![1, 2, 3], 10).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total, 10);
    }
}
