//! Database migrations
//!
//! Schema migrations are embedded in the binary as SQL strings, one variant
//! per supported driver. Applied versions are tracked in `_migrations`.
//!
//! ```ignore
//! use conduit::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! MySQL refuses CHECK constraints on columns that take part in a cascading
//! foreign key, so the no-self-follow rule is enforced by the store on SQLite
//! only and by `ProfileService` everywhere.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All schema migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                username VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                is_superuser BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                username VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_staff BOOLEAN NOT NULL DEFAULT FALSE,
                is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6)
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_profiles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                bio TEXT NOT NULL DEFAULT '',
                image VARCHAR(2048),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                user_id BIGINT NOT NULL UNIQUE,
                bio TEXT NOT NULL,
                image VARCHAR(2048),
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 3,
        name: "create_follows",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS follows (
                follower_id INTEGER NOT NULL,
                followee_id INTEGER NOT NULL,
                PRIMARY KEY (follower_id, followee_id),
                CHECK (follower_id <> followee_id),
                FOREIGN KEY (follower_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (followee_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_follows_followee_id ON follows(followee_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS follows (
                follower_id BIGINT NOT NULL,
                followee_id BIGINT NOT NULL,
                PRIMARY KEY (follower_id, followee_id),
                FOREIGN KEY (follower_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (followee_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_follows_followee_id ON follows(followee_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                body TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id);
            CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                body LONGTEXT NOT NULL,
                author_id BIGINT NOT NULL,
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
                FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_articles_author_id ON articles(author_id);
            CREATE INDEX idx_articles_created_at ON articles(created_at);
        "#,
    },
    Migration {
        version: 5,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS article_tags (
                article_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, tag_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_tags_tag_id ON article_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tag VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6)
            );
            CREATE TABLE IF NOT EXISTS article_tags (
                article_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (article_id, tag_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_article_tags_tag_id ON article_tags(tag_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_favorites",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS favorites (
                profile_id INTEGER NOT NULL,
                article_id INTEGER NOT NULL,
                PRIMARY KEY (profile_id, article_id),
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_favorites_article_id ON favorites(article_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS favorites (
                profile_id BIGINT NOT NULL,
                article_id BIGINT NOT NULL,
                PRIMARY KEY (profile_id, article_id),
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_favorites_article_id ON favorites(article_id);
        "#,
    },
    Migration {
        version: 7,
        name: "create_comments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                body TEXT NOT NULL,
                article_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                body TEXT NOT NULL,
                article_id BIGINT NOT NULL,
                author_id BIGINT NOT NULL,
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_comments_article_id ON comments(article_id);
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&(migration.version as i64)) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.sqlite()?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.mysql()?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin migration")?;

    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .context("Failed to record migration")?;

    tx.commit().await.context("Failed to commit migration")?;
    Ok(())
}

// MySQL commits DDL implicitly, so only the bookkeeping row is transactional.
async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_user_and_profile(pool: &SqlitePool, name: &str) -> i64 {
        let user_id = sqlx::query(
            "INSERT INTO users (email, username, password_hash) VALUES (?, ?, 'hash')",
        )
        .bind(format!("{}@example.com", name))
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to insert user")
        .last_insert_rowid();

        sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to insert profile")
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.unwrap();

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_email_and_username() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        insert_user_and_profile(sqlite, "jake").await;

        let dup_username = sqlx::query(
            "INSERT INTO users (email, username, password_hash) VALUES ('other@example.com', 'jake', 'h')",
        )
        .execute(sqlite)
        .await;
        assert!(dup_username.is_err());

        let dup_email = sqlx::query(
            "INSERT INTO users (email, username, password_hash) VALUES ('jake@example.com', 'other', 'h')",
        )
        .execute(sqlite)
        .await;
        assert!(dup_email.is_err());
    }

    #[tokio::test]
    async fn test_self_follow_rejected_by_store() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let profile_id = insert_user_and_profile(sqlite, "narcissus").await;

        let result = sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES (?, ?)")
            .bind(profile_id)
            .bind(profile_id)
            .execute(sqlite)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_content() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let author = insert_user_and_profile(sqlite, "author").await;
        let reader = insert_user_and_profile(sqlite, "reader").await;

        let article_id = sqlx::query(
            "INSERT INTO articles (slug, title, description, body, author_id) VALUES ('a-1', 'A', 'd', 'b', ?)",
        )
        .bind(author)
        .execute(sqlite)
        .await
        .unwrap()
        .last_insert_rowid();

        sqlx::query("INSERT INTO comments (body, article_id, author_id) VALUES ('hi', ?, ?)")
            .bind(article_id)
            .bind(reader)
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO favorites (profile_id, article_id) VALUES (?, ?)")
            .bind(reader)
            .bind(article_id)
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES (?, ?)")
            .bind(reader)
            .bind(author)
            .execute(sqlite)
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE username = 'author'")
            .execute(sqlite)
            .await
            .unwrap();

        for table in ["profiles WHERE id = ?", "articles WHERE author_id = ?"] {
            let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
                .bind(author)
                .fetch_one(sqlite)
                .await
                .unwrap();
            assert_eq!(row.get::<i64, _>("count"), 0, "{} not cascaded", table);
        }
        for table in ["comments", "favorites", "follows"] {
            let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
                .fetch_one(sqlite)
                .await
                .unwrap();
            assert_eq!(row.get::<i64, _>("count"), 0, "{} not cascaded", table);
        }
    }

    #[tokio::test]
    async fn test_get_migration() {
        assert_eq!(get_migration(1).map(|m| m.name), Some("create_users"));
        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_migration_versions_are_sequential() {
        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, idx + 1);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }
}
