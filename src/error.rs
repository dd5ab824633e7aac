use crate::db::error::DbError;
use crate::models::types::ChatId;
use crate::net::PlatformError;
use crate::util::retry::Transient;
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    /// No such catalog item / user / chat record
    #[error("not found: {0}")]
    NotFound(String),

    /// The chat already has an open spawn
    #[error("chat {0} already has an open spawn")]
    AlreadyOpen(ChatId),

    /// There is nothing to claim in this chat
    #[error("no active spawn in chat {0}")]
    NoActiveSpawn(ChatId),

    /// Debit would take the balance below the configured floor
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i64, need: i64 },

    /// Unique key already taken (catalog name + series)
    #[error("already exists: {0}")]
    Duplicate(String),

    /// Nothing to spawn. Needs an admin to upload items.
    #[error("catalog is empty")]
    EmptyCatalog,

    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl Transient for DomainError {
    fn is_transient(&self) -> bool {
        match self {
            DomainError::Db(e) => e.is_transient(),
            DomainError::Platform(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("missing env var: {0}")]
    MissingEnv(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
