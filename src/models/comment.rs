//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProfileView;

/// A comment on an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    /// Article this comment belongs to
    pub article_id: i64,
    /// Authoring profile ID
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment with its author as seen by a viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: ProfileView,
}
