//! Database layer
//!
//! Storage for the Conduit backend. Supported backends:
//! - SQLite (default, single-file deployment)
//! - MySQL
//!
//! The `DatabasePool` trait hides which backend is in use; repositories
//! dispatch on [`DatabasePool::driver`] for backend-specific SQL.
//!
//! # Usage
//!
//! ```ignore
//! use conduit::config::DatabaseConfig;
//! use conduit::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
