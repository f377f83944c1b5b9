//! Comment repository
//!
//! Database operations for comments. Comments of an article are returned
//! oldest first.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COMMENT_SELECT: &str =
    "SELECT id, body, article_id, author_id, created_at, updated_at FROM comments";

const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (body, article_id, author_id, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?)
"#;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment on an article
    async fn create(&self, article_id: i64, author_id: i64, body: &str) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments on an article, oldest first
    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>>;

    /// Delete a comment. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, article_id: i64, author_id: i64, body: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.sqlite()?, article_id, author_id, body).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.mysql()?, article_id, author_id, body).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!("{} WHERE id = ?", COMMENT_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get comment by ID")?;
                Ok(row.as_ref().map(row_to_comment_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get comment by ID")?;
                Ok(row.as_ref().map(row_to_comment_mysql))
            }
        }
    }

    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "{} WHERE article_id = ? ORDER BY created_at ASC, id ASC",
            COMMENT_SELECT
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(article_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list comments")?;
                Ok(rows.iter().map(row_to_comment_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(article_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list comments")?;
                Ok(rows.iter().map(row_to_comment_mysql).collect())
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        const SQL: &str = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    author_id: i64,
    body: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let id = sqlx::query(INSERT_COMMENT)
        .bind(body)
        .bind(article_id)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?
        .last_insert_rowid();

    Ok(Comment {
        id,
        body: body.to_string(),
        article_id,
        author_id,
        created_at: now,
        updated_at: now,
    })
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        article_id: row.get("article_id"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    article_id: i64,
    author_id: i64,
    body: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let id = sqlx::query(INSERT_COMMENT)
        .bind(body)
        .bind(article_id)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?
        .last_insert_id() as i64;

    Ok(Comment {
        id,
        body: body.to_string(),
        article_id,
        author_id,
        created_at: now,
        updated_at: now,
    })
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        article_id: row.get("article_id"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
