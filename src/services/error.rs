//! Service error taxonomy
//!
//! Every service returns [`ServiceError`]. The API layer maps each variant
//! to one HTTP status.

use thiserror::Error;

/// Message used for every authentication failure, whatever the cause
pub const INVALID_CREDENTIALS: &str = "A user with this email and password was not found.";

/// Message used when a non-author tries to change content
pub const NOT_AUTHOR: &str = "You must be the author of this content to modify it.";

/// Errors produced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Authentication failed; never says which half was wrong
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    /// Missing or unusable token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
