//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity.
///
/// Tags live independently of the articles that reference them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Display text
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag. The ID is assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}
