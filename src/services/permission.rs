//! Object-level authorization
//!
//! Reading is open to everyone. Changing an article or a comment is reserved
//! for its author, compared by profile.

use super::error::{ServiceError, ServiceResult, NOT_AUTHOR};
use crate::models::{Article, Comment};

/// The authenticated identity behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub profile_id: i64,
    pub username: String,
}

/// Something that has an author
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Article(&'a Article),
    Comment(&'a Comment),
}

impl Resource<'_> {
    /// Profile ID of the author
    pub fn author_id(&self) -> i64 {
        match self {
            Resource::Article(article) => article.author_id,
            Resource::Comment(comment) => comment.author_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    /// Safe actions never change state
    pub fn is_safe(self) -> bool {
        matches!(self, Action::Read)
    }
}

/// Whether the principal may update or delete the resource
pub fn can_mutate(principal: &Principal, resource: Resource<'_>) -> bool {
    resource.author_id() == principal.profile_id
}

/// Allow `action` on `resource`, or explain why not
pub fn authorize(
    principal: Option<&Principal>,
    action: Action,
    resource: Resource<'_>,
) -> ServiceResult<()> {
    if action.is_safe() {
        return Ok(());
    }

    match principal {
        Some(principal) if can_mutate(principal, resource) => Ok(()),
        Some(_) => Err(ServiceError::Forbidden(NOT_AUTHOR.to_string())),
        None => Err(ServiceError::unauthorized(
            "Authentication credentials were not provided.",
        )),
    }
}
