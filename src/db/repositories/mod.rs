//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the storage operations of one entity.

pub mod article;
pub mod comment;
pub mod profile;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use profile::{ProfileRepository, SqlxProfileRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Whether a repository error was caused by a UNIQUE constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}
