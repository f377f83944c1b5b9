//! Data models
//!
//! Data structures shared by the repositories, services and API layer:
//! - Database entities (User, Profile, Article, Comment, Tag)
//! - Service inputs and list parameters
//! - Viewer-specific projections (`ProfileView`, `ArticleView`, `CommentView`)

mod article;
mod comment;
mod profile;
mod tag;
mod user;

pub use article::{
    Article, ArticleFilter, ArticleView, CreateArticleInput, ListParams, NewArticle, PagedResult,
    UpdateArticleInput, MAX_SLUG_LENGTH,
};
pub use comment::{Comment, CommentView};
pub use profile::{Profile, ProfileView};
pub use tag::Tag;
pub use user::{Account, UpdateAccountInput, User};
