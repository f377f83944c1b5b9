//! Database connection pool abstraction
//!
//! A single interface over the SQLite and MySQL backends. Which pool gets
//! created is decided by `database.driver` in the configuration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Database pool trait that abstracts over the supported backends.
///
/// Repositories dispatch on [`DatabasePool::driver`] and then borrow the
/// concrete pool through [`DatabasePool::sqlite`] or [`DatabasePool::mysql`].
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Get the database driver type
    fn driver(&self) -> DatabaseDriver;

    /// Get the underlying SQLite pool if this is a SQLite connection
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Get the underlying MySQL pool if this is a MySQL connection
    fn as_mysql(&self) -> Option<&MySqlPool>;

    /// Like [`DatabasePool::as_sqlite`], but a driver mismatch is an error
    fn sqlite(&self) -> Result<&SqlitePool> {
        self.as_sqlite()
            .context("Database pool is not backed by SQLite")
    }

    /// Like [`DatabasePool::as_mysql`], but a driver mismatch is an error
    fn mysql(&self) -> Result<&MySqlPool> {
        self.as_mysql()
            .context("Database pool is not backed by MySQL")
    }
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite connection pool
    ///
    /// Accepts `:memory:`, a `sqlite:` URL or a bare file path. Parent
    /// directories of file databases are created on demand.
    pub async fn new(url: &str) -> Result<Self> {
        let is_memory = url == ":memory:" || url.starts_with("sqlite::memory:");

        if !is_memory {
            let path = url.trim_start_matches("sqlite:");
            let path = path.split('?').next().unwrap_or(path);

            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let connection_url = if url == ":memory:" {
            "sqlite::memory:".to_string()
        } else if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite:{}", url)
        };

        // Every pooled connection needs foreign keys on for the cascades to fire.
        let options = SqliteConnectOptions::from_str(&connection_url)
            .with_context(|| format!("Invalid SQLite URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(if is_memory { 1 } else { 20 })
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL connection pool implementation
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Create a new MySQL connection pool
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
///
/// # Example
///
/// ```ignore
/// use conduit::config::DatabaseConfig;
/// use conduit::db::create_pool;
///
/// let pool = create_pool(&DatabaseConfig::default()).await?;
/// pool.ping().await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => {
            let db = SqliteDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
        DatabaseDriver::Mysql => {
            let db = MysqlDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
    }
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
        assert!(pool.sqlite().is_ok());
        assert!(pool.mysql().is_err());
    }

    #[tokio::test]
    async fn test_sqlite_pool_ping_and_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        pool.execute("CREATE TABLE scratch (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        let affected = pool
            .execute("INSERT INTO scratch (name) VALUES ('x')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_sqlite_foreign_keys_enforced() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        pool.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        pool.execute(
            "CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER NOT NULL REFERENCES parent(id))",
        )
        .await
        .unwrap();

        let result = pool
            .execute("INSERT INTO child (parent_id) VALUES (42)")
            .await;
        assert!(result.is_err(), "dangling foreign key should be rejected");
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("conduit.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        assert!(db_path.exists());
        pool.close().await;
    }

    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_ping() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let config = DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        pool.ping().await.expect("Ping should succeed");
    }
}
