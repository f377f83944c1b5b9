//! User repository
//!
//! Database operations for accounts. A user and its profile are always
//! written together: [`UserRepository::create_with_profile`] and
//! [`UserRepository::update_with_profile`] each run in one transaction.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Account, Profile, User};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::profile::{row_to_profile_mysql, row_to_profile_sqlite, PROFILE_SELECT};

const USER_SELECT: &str = r#"
    SELECT id, email, username, password_hash, is_active, is_staff, is_superuser, created_at, updated_at
    FROM users
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (email, username, password_hash, is_active, is_staff, is_superuser, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_PROFILE: &str = r#"
    INSERT INTO profiles (user_id, bio, image, created_at, updated_at)
    VALUES (?, '', NULL, ?, ?)
"#;

const UPDATE_USER: &str = r#"
    UPDATE users
    SET email = ?, username = ?, password_hash = ?, is_active = ?, updated_at = ?
    WHERE id = ?
"#;

const UPDATE_PROFILE: &str = r#"
    UPDATE profiles
    SET bio = ?, image = ?, updated_at = ?
    WHERE id = ? AND user_id = ?
"#;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and its (empty) profile as one unit of work
    async fn create_with_profile(&self, user: &User) -> Result<Account>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Write user and profile fields in one transaction.
    ///
    /// Fails, leaving both rows untouched, if either row is not updated.
    async fn update_with_profile(&self, user: &User, profile: &Profile) -> Result<Account>;

    /// Set the active flag. Returns false if the user does not exist.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool>;

    /// Delete a user; the profile and authored content cascade
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_with_profile(&self, user: &User) -> Result<Account> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_with_profile_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => create_with_profile_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("{} WHERE id = ?", USER_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_field_sqlite(self.pool.sqlite()?, "email", email).await
            }
            DatabaseDriver::Mysql => get_user_by_field_mysql(self.pool.mysql()?, "email", email).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_field_sqlite(self.pool.sqlite()?, "username", username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_field_mysql(self.pool.mysql()?, "username", username).await
            }
        }
    }

    async fn update_with_profile(&self, user: &User, profile: &Profile) -> Result<Account> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_with_profile_sqlite(self.pool.sqlite()?, user, profile).await
            }
            DatabaseDriver::Mysql => {
                update_with_profile_mysql(self.pool.mysql()?, user, profile).await
            }
        }
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        const SQL: &str = "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(active)
                .bind(now)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to update user status")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(active)
                .bind(now)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to update user status")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        const SQL: &str = "DELETE FROM users WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(SQL)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete user")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(SQL)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete user")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_with_profile_sqlite(pool: &SqlitePool, user: &User) -> Result<Account> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let user_id = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create user")?
        .last_insert_rowid();

    let profile_id = sqlx::query(INSERT_PROFILE)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create profile")?
        .last_insert_rowid();

    tx.commit().await.context("Failed to commit account")?;

    Ok(new_account(user, user_id, profile_id, now))
}

async fn get_user_by_field_sqlite(
    pool: &SqlitePool,
    field: &str,
    value: &str,
) -> Result<Option<User>> {
    let sql = format!("{} WHERE {} = ?", USER_SELECT, field);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", field))?;

    Ok(row.as_ref().map(row_to_user_sqlite))
}

async fn update_with_profile_sqlite(
    pool: &SqlitePool,
    user: &User,
    profile: &Profile,
) -> Result<Account> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let updated = sqlx::query(UPDATE_USER)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(now)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update user")?
        .rows_affected();
    if updated == 0 {
        bail!("User {} not found", user.id);
    }

    let updated = sqlx::query(UPDATE_PROFILE)
        .bind(&profile.bio)
        .bind(&profile.image)
        .bind(now)
        .bind(profile.id)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update profile")?
        .rows_affected();
    if updated == 0 {
        // Dropping `tx` rolls the user write back.
        bail!("Profile {} of user {} not found", profile.id, user.id);
    }

    let user_row = sqlx::query(&format!("{} WHERE id = ?", USER_SELECT))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reload user")?;
    let profile_row = sqlx::query(&format!("{} WHERE p.id = ?", PROFILE_SELECT))
        .bind(profile.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reload profile")?;

    tx.commit().await.context("Failed to commit account update")?;

    Ok(Account {
        user: row_to_user_sqlite(&user_row),
        profile: row_to_profile_sqlite(&profile_row),
    })
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_with_profile_mysql(pool: &MySqlPool, user: &User) -> Result<Account> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let user_id = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create user")?
        .last_insert_id() as i64;

    let profile_id = sqlx::query(INSERT_PROFILE)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create profile")?
        .last_insert_id() as i64;

    tx.commit().await.context("Failed to commit account")?;

    Ok(new_account(user, user_id, profile_id, now))
}

async fn get_user_by_field_mysql(
    pool: &MySqlPool,
    field: &str,
    value: &str,
) -> Result<Option<User>> {
    let sql = format!("{} WHERE {} = ?", USER_SELECT, field);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", field))?;

    Ok(row.as_ref().map(row_to_user_mysql))
}

async fn update_with_profile_mysql(
    pool: &MySqlPool,
    user: &User,
    profile: &Profile,
) -> Result<Account> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let updated = sqlx::query(UPDATE_USER)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(now)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update user")?
        .rows_affected();
    if updated == 0 {
        bail!("User {} not found", user.id);
    }

    let updated = sqlx::query(UPDATE_PROFILE)
        .bind(&profile.bio)
        .bind(&profile.image)
        .bind(now)
        .bind(profile.id)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update profile")?
        .rows_affected();
    if updated == 0 {
        bail!("Profile {} of user {} not found", profile.id, user.id);
    }

    let user_row = sqlx::query(&format!("{} WHERE id = ?", USER_SELECT))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reload user")?;
    let profile_row = sqlx::query(&format!("{} WHERE p.id = ?", PROFILE_SELECT))
        .bind(profile.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reload profile")?;

    tx.commit().await.context("Failed to commit account update")?;

    Ok(Account {
        user: row_to_user_mysql(&user_row),
        profile: row_to_profile_mysql(&profile_row),
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn new_account(user: &User, user_id: i64, profile_id: i64, now: chrono::DateTime<Utc>) -> Account {
    Account {
        user: User {
            id: user_id,
            created_at: now,
            updated_at: now,
            ..user.clone()
        },
        profile: Profile {
            id: profile_id,
            user_id,
            username: user.username.clone(),
            bio: String::new(),
            image: None,
            created_at: now,
            updated_at: now,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::is_unique_violation;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn create_test_user(username: &str, email: &str) -> User {
        User::new(email.to_string(), username.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_create_with_profile() {
        let repo = setup_test_repo().await;

        let account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .expect("Failed to create account");

        assert!(account.user.id > 0);
        assert!(account.profile.id > 0);
        assert_eq!(account.profile.user_id, account.user.id);
        assert_eq!(account.profile.username, "jake");
        assert_eq!(account.profile.bio, "");
        assert!(account.user.is_active);
    }

    #[tokio::test]
    async fn test_get_by_email_and_username() {
        let repo = setup_test_repo().await;
        let account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        let by_email = repo.get_by_email("jake@jake.jake").await.unwrap().unwrap();
        let by_name = repo.get_by_username("jake").await.unwrap().unwrap();
        let by_id = repo.get_by_id(account.user.id).await.unwrap().unwrap();

        assert_eq!(by_email.id, account.user.id);
        assert_eq!(by_name.id, account.user.id);
        assert_eq!(by_id.email, "jake@jake.jake");
        assert!(repo.get_by_email("nobody@x.io").await.unwrap().is_none());
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let repo = setup_test_repo().await;
        repo.create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        let err = repo
            .create_with_profile(&create_test_user("jake", "other@jake.jake"))
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(repo.get_by_email("other@jake.jake").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_with_profile() {
        let repo = setup_test_repo().await;
        let mut account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        account.user.username = "jacob".to_string();
        account.profile.bio = "I work at statefarm".to_string();
        account.profile.image = Some("https://i.stack.imgur.com/xHWG8.jpg".to_string());

        let updated = repo
            .update_with_profile(&account.user, &account.profile)
            .await
            .expect("Failed to update account");

        assert_eq!(updated.user.username, "jacob");
        assert_eq!(updated.profile.username, "jacob");
        assert_eq!(updated.profile.bio, "I work at statefarm");
        assert_eq!(
            updated.profile.image.as_deref(),
            Some("https://i.stack.imgur.com/xHWG8.jpg")
        );
    }

    #[tokio::test]
    async fn test_update_rolls_back_user_when_profile_write_fails() {
        let repo = setup_test_repo().await;
        let mut account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        account.user.username = "renamed".to_string();
        account.profile.id = 9_999;

        let result = repo
            .update_with_profile(&account.user, &account.profile)
            .await;
        assert!(result.is_err());

        let stored = repo.get_by_id(account.user.id).await.unwrap().unwrap();
        assert_eq!(stored.username, "jake");
    }

    #[tokio::test]
    async fn test_set_active() {
        let repo = setup_test_repo().await;
        let account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        assert!(repo.set_active(account.user.id, false).await.unwrap());
        assert!(!repo.get_by_id(account.user.id).await.unwrap().unwrap().is_active);
        assert!(!repo.set_active(999, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = setup_test_repo().await;
        let account = repo
            .create_with_profile(&create_test_user("jake", "jake@jake.jake"))
            .await
            .unwrap();

        repo.delete(account.user.id).await.unwrap();

        assert!(repo.get_by_id(account.user.id).await.unwrap().is_none());
    }
}
