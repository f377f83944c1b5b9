//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! Lists are ordered newest first, with the ID breaking ties between rows
//! created in the same instant.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleFilter, ListParams, NewArticle, UpdateArticleInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const ARTICLE_SELECT: &str = r#"
    SELECT a.id, a.slug, a.title, a.description, a.body, a.author_id, a.created_at, a.updated_at
    FROM articles a
"#;

const INSERT_ARTICLE: &str = r#"
    INSERT INTO articles (slug, title, description, body, author_id, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE articles
    SET title = ?, description = ?, body = ?, updated_at = ?
    WHERE id = ?
"#;

const FEED_CLAUSE: &str =
    " WHERE a.author_id IN (SELECT f.followee_id FROM follows f WHERE f.follower_id = ?)";

const NEWEST_FIRST: &str = " ORDER BY a.created_at DESC, a.id DESC LIMIT ? OFFSET ?";

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert an article. A taken slug surfaces as a unique violation.
    async fn create(&self, input: &NewArticle) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get article by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update title, description and body; the slug is left alone
    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article>;

    /// Delete an article. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List articles matching every filter that is set, newest first.
    ///
    /// Returns the requested window and the total number of matches.
    async fn list(&self, filter: &ArticleFilter, params: &ListParams) -> Result<(Vec<Article>, i64)>;

    /// List articles authored by profiles `follower_id` follows, newest first
    async fn feed(&self, follower_id: i64, params: &ListParams) -> Result<(Vec<Article>, i64)>;

    /// Number of profiles that favorited the article
    async fn favorites_count(&self, article_id: i64) -> Result<i64>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, input: &NewArticle) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_article_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_article_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_article_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Article {} not found", id))?;

        let updated = Article {
            title: input.title.clone().unwrap_or(existing.title),
            description: input.description.clone().unwrap_or(existing.description),
            body: input.body.clone().unwrap_or(existing.body),
            updated_at: Utc::now(),
            ..existing
        };

        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(self.pool.sqlite()?, &updated).await?,
            DatabaseDriver::Mysql => update_article_mysql(self.pool.mysql()?, &updated).await?,
        }

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        const SQL: &str = "DELETE FROM articles WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list(&self, filter: &ArticleFilter, params: &ListParams) -> Result<(Vec<Article>, i64)> {
        let (clause, binds) = filter_clause(filter);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.sqlite()?, &clause, &binds, params).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.mysql()?, &clause, &binds, params).await
            }
        }
    }

    async fn feed(&self, follower_id: i64, params: &ListParams) -> Result<(Vec<Article>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => feed_sqlite(self.pool.sqlite()?, follower_id, params).await,
            DatabaseDriver::Mysql => feed_mysql(self.pool.mysql()?, follower_id, params).await,
        }
    }

    async fn favorites_count(&self, article_id: i64) -> Result<i64> {
        const SQL: &str = "SELECT COUNT(*) AS count FROM favorites WHERE article_id = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(article_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count favorites")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(article_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count favorites")?
                .get("count"),
        };
        Ok(count)
    }
}

/// Build the WHERE clause for a list filter, with its bind values in order
fn filter_clause(filter: &ArticleFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(author) = &filter.author {
        conditions.push(
            "a.author_id IN (SELECT p.id FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.username = ?)",
        );
        binds.push(author.clone());
    }
    if let Some(tag) = &filter.tag {
        conditions.push(
            "a.id IN (SELECT atg.article_id FROM article_tags atg JOIN tags t ON t.id = atg.tag_id WHERE t.slug = ? OR t.tag = ?)",
        );
        binds.push(tag.clone());
        binds.push(tag.clone());
    }
    if let Some(favorited) = &filter.favorited {
        conditions.push(
            "a.id IN (SELECT f.article_id FROM favorites f JOIN profiles p ON p.id = f.profile_id JOIN users u ON u.id = p.user_id WHERE u.username = ?)",
        );
        binds.push(favorited.clone());
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, input: &NewArticle) -> Result<Article> {
    let now = Utc::now();

    let id = sqlx::query(INSERT_ARTICLE)
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.body)
        .bind(input.author_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?
        .last_insert_rowid();

    Ok(new_article(id, input, now))
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", ARTICLE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    Ok(row.as_ref().map(row_to_article_sqlite))
}

async fn get_article_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE a.slug = ?", ARTICLE_SELECT))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by slug")?;

    Ok(row.as_ref().map(row_to_article_sqlite))
}

async fn update_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<()> {
    sqlx::query(UPDATE_ARTICLE)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .bind(article.updated_at)
        .bind(article.id)
        .execute(pool)
        .await
        .context("Failed to update article")?;
    Ok(())
}

async fn list_articles_sqlite(
    pool: &SqlitePool,
    clause: &str,
    binds: &[String],
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let sql = format!("{}{}{}", ARTICLE_SELECT, clause, NEWEST_FIRST);
    let mut query = sqlx::query(&sql);
    for value in binds {
        query = query.bind(value);
    }
    let rows = query
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let count_sql = format!("SELECT COUNT(*) AS count FROM articles a{}", clause);
    let mut count_query = sqlx::query(&count_sql);
    for value in binds {
        count_query = count_query.bind(value);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?
        .get("count");

    Ok((rows.iter().map(row_to_article_sqlite).collect(), total))
}

async fn feed_sqlite(
    pool: &SqlitePool,
    follower_id: i64,
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let rows = sqlx::query(&format!("{}{}{}", ARTICLE_SELECT, FEED_CLAUSE, NEWEST_FIRST))
        .bind(follower_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list feed")?;

    let total: i64 = sqlx::query(&format!("SELECT COUNT(*) AS count FROM articles a{}", FEED_CLAUSE))
        .bind(follower_id)
        .fetch_one(pool)
        .await
        .context("Failed to count feed")?
        .get("count");

    Ok((rows.iter().map(row_to_article_sqlite).collect(), total))
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        body: row.get("body"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, input: &NewArticle) -> Result<Article> {
    let now = Utc::now();

    let id = sqlx::query(INSERT_ARTICLE)
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.body)
        .bind(input.author_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?
        .last_insert_id() as i64;

    Ok(new_article(id, input, now))
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", ARTICLE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    Ok(row.as_ref().map(row_to_article_mysql))
}

async fn get_article_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE a.slug = ?", ARTICLE_SELECT))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by slug")?;

    Ok(row.as_ref().map(row_to_article_mysql))
}

async fn update_article_mysql(pool: &MySqlPool, article: &Article) -> Result<()> {
    sqlx::query(UPDATE_ARTICLE)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .bind(article.updated_at)
        .bind(article.id)
        .execute(pool)
        .await
        .context("Failed to update article")?;
    Ok(())
}

async fn list_articles_mysql(
    pool: &MySqlPool,
    clause: &str,
    binds: &[String],
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let sql = format!("{}{}{}", ARTICLE_SELECT, clause, NEWEST_FIRST);
    let mut query = sqlx::query(&sql);
    for value in binds {
        query = query.bind(value);
    }
    let rows = query
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let count_sql = format!("SELECT COUNT(*) AS count FROM articles a{}", clause);
    let mut count_query = sqlx::query(&count_sql);
    for value in binds {
        count_query = count_query.bind(value);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?
        .get("count");

    Ok((rows.iter().map(row_to_article_mysql).collect(), total))
}

async fn feed_mysql(
    pool: &MySqlPool,
    follower_id: i64,
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let rows = sqlx::query(&format!("{}{}{}", ARTICLE_SELECT, FEED_CLAUSE, NEWEST_FIRST))
        .bind(follower_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list feed")?;

    let total: i64 = sqlx::query(&format!("SELECT COUNT(*) AS count FROM articles a{}", FEED_CLAUSE))
        .bind(follower_id)
        .fetch_one(pool)
        .await
        .context("Failed to count feed")?
        .get("count");

    Ok((rows.iter().map(row_to_article_mysql).collect(), total))
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Article {
    Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        body: row.get("body"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn new_article(id: i64, input: &NewArticle, now: chrono::DateTime<Utc>) -> Article {
    Article {
        id,
        slug: input.slug.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        body: input.body.clone(),
        author_id: input.author_id,
        created_at: now,
        updated_at: now,
    }
}
