use thiserror::Error;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Internal(String),

    #[error(transparent)]
    CoreError(#[from] scoreit_core::error::CoreError),
}

impl DbError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
