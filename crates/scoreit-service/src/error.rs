use thiserror::Error;

use crate::auth::token::TokenError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    DatabaseError(#[from] scoreit_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] scoreit_core::error::CoreError),

    #[error(transparent)]
    TokenError(#[from] TokenError),

    /// Authentication-stage rejection. Deliberately carries no detail.
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
