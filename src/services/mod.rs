//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules and validation
//! - Coordinating between repositories
//! - Object-level authorization
//! - Mapping every failure onto [`ServiceError`]

pub mod article;
pub mod comment;
pub mod error;
pub mod password;
pub mod permission;
pub mod profile;
pub mod tag;
pub mod token;
pub mod user;

pub use article::{generate_slug, ArticleService};
pub use comment::CommentService;
pub use error::{ServiceError, ServiceResult};
pub use password::{hash_password, verify_password};
pub use permission::{authorize, can_mutate, Action, Principal, Resource};
pub use profile::ProfileService;
pub use tag::{generate_tag_slug, TagService};
pub use token::{Claims, TokenService};
pub use user::{AuthenticatedAccount, LoginInput, RegisterInput, UserService};
