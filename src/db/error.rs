use crate::util::retry::Transient;
use deadpool_postgres::{BuildError, PoolError};
use thiserror::Error;

// DbError is the lowest level error type, wrapping errors from the storage layer. It does not wrap
// any higher level errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Record not found
    #[error("not found")]
    NotFound,

    /// Unique constraint violation
    #[error("unique violation")]
    UniqueViolation,

    /// Foreign key constraint violation
    #[error("foreign key violation")]
    ForeignKey,

    /// Waited too long for a connection
    #[error("timeout")]
    Timeout,

    /// Store could not be reached (connection refused, connection closed)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Pool(PoolError),

    #[error(transparent)]
    Pg(tokio_postgres::Error),

    #[error(transparent)]
    Migrate(#[from] refinery::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("row decode error: {0}")]
    Decode(String),

    #[error("input error: {0}")]
    Validation(String),
}

impl From<PoolError> for DbError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Timeout(_) => DbError::Timeout,
            PoolError::Backend(be) => DbError::from(be),
            other => DbError::Pool(other),
        }
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.is_closed() {
            return DbError::Unavailable(e.to_string());
        }
        match e.code() {
            Some(code) if *code == tokio_postgres::error::SqlState::UNIQUE_VIOLATION => DbError::UniqueViolation,
            Some(code) if *code == tokio_postgres::error::SqlState::FOREIGN_KEY_VIOLATION => DbError::ForeignKey,
            _ => DbError::Pg(e),
        }
    }
}

impl Transient for DbError {
    fn is_transient(&self) -> bool {
        matches!(self, DbError::Timeout | DbError::Unavailable(_) | DbError::Pool(_))
    }
}
