//! Tag repository
//!
//! Tags and the `article_tags` link table.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const TAG_SELECT: &str = "SELECT t.id, t.tag, t.slug, t.created_at, t.updated_at FROM tags t";

const INSERT_TAG: &str =
    "INSERT INTO tags (tag, slug, created_at, updated_at) VALUES (?, ?, ?, ?)";

const ARTICLE_TAGS: &str = r#"
    SELECT t.id, t.tag, t.slug, t.created_at, t.updated_at
    FROM tags t
    JOIN article_tags atg ON atg.tag_id = t.id
    WHERE atg.article_id = ?
    ORDER BY t.tag
"#;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Insert a tag. A taken slug surfaces as a unique violation.
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// All tags, alphabetical by display text
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Tags attached to an article, alphabetical
    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>>;

    /// Attach a tag to an article. No-op when already attached.
    async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<()>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let sql = format!("{} WHERE t.slug = ?", TAG_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get tag by slug")?;
                Ok(row.as_ref().map(row_to_tag_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get tag by slug")?;
                Ok(row.as_ref().map(row_to_tag_mysql))
            }
        }
    }

    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_TAG)
                .bind(&tag.name)
                .bind(&tag.slug)
                .bind(tag.created_at)
                .bind(tag.updated_at)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create tag")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_TAG)
                .bind(&tag.name)
                .bind(&tag.slug)
                .bind(tag.created_at)
                .bind(tag.updated_at)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create tag")?
                .last_insert_id() as i64,
        };

        Ok(Tag { id, ..tag.clone() })
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let sql = format!("{} ORDER BY t.tag", TAG_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list tags")?;
                Ok(rows.iter().map(row_to_tag_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list tags")?;
                Ok(rows.iter().map(row_to_tag_mysql).collect())
            }
        }
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(ARTICLE_TAGS)
                    .bind(article_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to get article tags")?;
                Ok(rows.iter().map(row_to_tag_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(ARTICLE_TAGS)
                    .bind(article_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to get article tags")?;
                Ok(rows.iter().map(row_to_tag_mysql).collect())
            }
        }
    }

    async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                    .bind(article_id)
                    .bind(tag_id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to tag article")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("INSERT IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                    .bind(article_id)
                    .bind(tag_id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to tag article")?;
            }
        }
        Ok(())
    }
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("tag"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("tag"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
