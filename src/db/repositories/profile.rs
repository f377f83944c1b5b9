//! Profile repository
//!
//! Profile lookups plus the two relation sets a profile owns:
//! - follows: profile -> profile
//! - favorites: profile -> article
//!
//! Both relations are plain link rows, so adding and removing are idempotent.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Profile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Profile columns with the username joined from `users`.
pub(super) const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.username, p.bio, p.image, p.created_at, p.updated_at
    FROM profiles p
    JOIN users u ON u.id = p.user_id
"#;

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Get profile by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Profile>>;

    /// Get the profile owned by a user
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Profile>>;

    /// Get profile by the owning user's username
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>>;

    /// Add `followee` to the follow set of `follower`. No-op when already present.
    async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<()>;

    /// Remove `followee` from the follow set of `follower`. No-op when absent.
    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<()>;

    /// Whether `follower` follows `followee`
    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool>;

    /// Whether `profile` is followed by `other`
    async fn is_followed_by(&self, profile_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, profile_id).await
    }

    /// IDs of every profile `follower` follows
    async fn followed_ids(&self, follower_id: i64) -> Result<Vec<i64>>;

    /// Add an article to the favorite set. No-op when already present.
    async fn favorite(&self, profile_id: i64, article_id: i64) -> Result<()>;

    /// Remove an article from the favorite set. No-op when absent.
    async fn unfavorite(&self, profile_id: i64, article_id: i64) -> Result<()>;

    /// Whether the profile has favorited the article
    async fn has_favorited(&self, profile_id: i64, article_id: i64) -> Result<bool>;
}

/// SQLx-based profile repository implementation
pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Profile>> {
        let sql = format!("{} WHERE p.id = ?", PROFILE_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_profile_sqlite(self.pool.sqlite()?, &sql, id).await,
            DatabaseDriver::Mysql => fetch_profile_mysql(self.pool.mysql()?, &sql, id).await,
        }
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Profile>> {
        let sql = format!("{} WHERE p.user_id = ?", PROFILE_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_profile_sqlite(self.pool.sqlite()?, &sql, user_id).await,
            DatabaseDriver::Mysql => fetch_profile_mysql(self.pool.mysql()?, &sql, user_id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>> {
        let sql = format!("{} WHERE u.username = ?", PROFILE_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_profile_sqlite(self.pool.sqlite()?, &sql, username).await
            }
            DatabaseDriver::Mysql => fetch_profile_mysql(self.pool.mysql()?, &sql, username).await,
        }
    }

    async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                link_sqlite(
                    self.pool.sqlite()?,
                    "INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)",
                    follower_id,
                    followee_id,
                )
                .await
                .context("Failed to follow profile")
            }
            DatabaseDriver::Mysql => {
                link_mysql(
                    self.pool.mysql()?,
                    "INSERT IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)",
                    follower_id,
                    followee_id,
                )
                .await
                .context("Failed to follow profile")
            }
        }
    }

    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        const SQL: &str = "DELETE FROM follows WHERE follower_id = ? AND followee_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => link_sqlite(self.pool.sqlite()?, SQL, follower_id, followee_id)
                .await
                .context("Failed to unfollow profile"),
            DatabaseDriver::Mysql => link_mysql(self.pool.mysql()?, SQL, follower_id, followee_id)
                .await
                .context("Failed to unfollow profile"),
        }
    }

    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        const SQL: &str =
            "SELECT COUNT(*) AS count FROM follows WHERE follower_id = ? AND followee_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                link_exists_sqlite(self.pool.sqlite()?, SQL, follower_id, followee_id).await
            }
            DatabaseDriver::Mysql => {
                link_exists_mysql(self.pool.mysql()?, SQL, follower_id, followee_id).await
            }
        }
    }

    async fn followed_ids(&self, follower_id: i64) -> Result<Vec<i64>> {
        const SQL: &str =
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY followee_id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(SQL)
                    .bind(follower_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list followed profiles")?;
                Ok(rows.iter().map(|row| row.get("followee_id")).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(SQL)
                    .bind(follower_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list followed profiles")?;
                Ok(rows.iter().map(|row| row.get("followee_id")).collect())
            }
        }
    }

    async fn favorite(&self, profile_id: i64, article_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                link_sqlite(
                    self.pool.sqlite()?,
                    "INSERT OR IGNORE INTO favorites (profile_id, article_id) VALUES (?, ?)",
                    profile_id,
                    article_id,
                )
                .await
                .context("Failed to favorite article")
            }
            DatabaseDriver::Mysql => {
                link_mysql(
                    self.pool.mysql()?,
                    "INSERT IGNORE INTO favorites (profile_id, article_id) VALUES (?, ?)",
                    profile_id,
                    article_id,
                )
                .await
                .context("Failed to favorite article")
            }
        }
    }

    async fn unfavorite(&self, profile_id: i64, article_id: i64) -> Result<()> {
        const SQL: &str = "DELETE FROM favorites WHERE profile_id = ? AND article_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => link_sqlite(self.pool.sqlite()?, SQL, profile_id, article_id)
                .await
                .context("Failed to unfavorite article"),
            DatabaseDriver::Mysql => link_mysql(self.pool.mysql()?, SQL, profile_id, article_id)
                .await
                .context("Failed to unfavorite article"),
        }
    }

    async fn has_favorited(&self, profile_id: i64, article_id: i64) -> Result<bool> {
        const SQL: &str =
            "SELECT COUNT(*) AS count FROM favorites WHERE profile_id = ? AND article_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                link_exists_sqlite(self.pool.sqlite()?, SQL, profile_id, article_id).await
            }
            DatabaseDriver::Mysql => {
                link_exists_mysql(self.pool.mysql()?, SQL, profile_id, article_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn fetch_profile_sqlite<'q, T>(pool: &SqlitePool, sql: &'q str, key: T) -> Result<Option<Profile>>
where
    T: 'q + Send + sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    let row = sqlx::query(sql)
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get profile")?;

    Ok(row.as_ref().map(row_to_profile_sqlite))
}

async fn link_sqlite(pool: &SqlitePool, sql: &str, left: i64, right: i64) -> Result<()> {
    sqlx::query(sql).bind(left).bind(right).execute(pool).await?;
    Ok(())
}

async fn link_exists_sqlite(pool: &SqlitePool, sql: &str, left: i64, right: i64) -> Result<bool> {
    let row = sqlx::query(sql)
        .bind(left)
        .bind(right)
        .fetch_one(pool)
        .await
        .context("Failed to check relation")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_profile_sqlite(row: &sqlx::sqlite::SqliteRow) -> Profile {
    Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        bio: row.get("bio"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_profile_mysql<'q, T>(pool: &MySqlPool, sql: &'q str, key: T) -> Result<Option<Profile>>
where
    T: 'q + Send + sqlx::Encode<'q, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    let row = sqlx::query(sql)
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get profile")?;

    Ok(row.as_ref().map(row_to_profile_mysql))
}

async fn link_mysql(pool: &MySqlPool, sql: &str, left: i64, right: i64) -> Result<()> {
    sqlx::query(sql).bind(left).bind(right).execute(pool).await?;
    Ok(())
}

async fn link_exists_mysql(pool: &MySqlPool, sql: &str, left: i64, right: i64) -> Result<bool> {
    let row = sqlx::query(sql)
        .bind(left)
        .bind(right)
        .fetch_one(pool)
        .await
        .context("Failed to check relation")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_profile_mysql(row: &sqlx::mysql::MySqlRow) -> Profile {
    Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        bio: row.get("bio"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Account, User};

    async fn setup_test_repo() -> (SqlxUserRepository, SqlxProfileRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxUserRepository::new(pool.clone()),
            SqlxProfileRepository::new(pool),
        )
    }

    async fn create_account(users: &SqlxUserRepository, name: &str) -> Account {
        let user = User::new(format!("{}@example.com", name), name.to_string(), "hash".into());
        users
            .create_with_profile(&user)
            .await
            .expect("Failed to create account")
    }

    #[tokio::test]
    async fn test_profile_lookups_agree() {
        let (users, profiles) = setup_test_repo().await;
        let account = create_account(&users, "jake").await;

        let by_id = profiles.get_by_id(account.profile.id).await.unwrap().unwrap();
        let by_user = profiles.get_by_user_id(account.user.id).await.unwrap().unwrap();
        let by_name = profiles.get_by_username("jake").await.unwrap().unwrap();

        assert_eq!(by_id, by_user);
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.username, "jake");
        assert_eq!(by_id.bio, "");
        assert!(by_id.image.is_none());
    }

    #[tokio::test]
    async fn test_get_by_username_not_found() {
        let (_users, profiles) = setup_test_repo().await;
        assert!(profiles.get_by_username("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_follow_is_idempotent_and_directed() {
        let (users, profiles) = setup_test_repo().await;
        let a = create_account(&users, "alice").await.profile;
        let b = create_account(&users, "bob").await.profile;

        profiles.follow(a.id, b.id).await.unwrap();
        profiles.follow(a.id, b.id).await.unwrap();

        assert!(profiles.is_following(a.id, b.id).await.unwrap());
        assert!(!profiles.is_following(b.id, a.id).await.unwrap());
        assert!(profiles.is_followed_by(b.id, a.id).await.unwrap());
        assert!(!profiles.is_followed_by(a.id, b.id).await.unwrap());
        assert_eq!(profiles.followed_ids(a.id).await.unwrap(), vec![b.id]);

        profiles.unfollow(a.id, b.id).await.unwrap();
        profiles.unfollow(a.id, b.id).await.unwrap();

        assert!(!profiles.is_following(a.id, b.id).await.unwrap());
        assert!(profiles.followed_ids(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_missing_profile_fails() {
        let (users, profiles) = setup_test_repo().await;
        let a = create_account(&users, "alice").await.profile;

        assert!(profiles.follow(a.id, 9_999).await.is_err());
    }
}
