use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Entity not found: {id}")]
    NotFound { id: String },

    #[error("Duplicate entity: {id} (identical payload already stored)")]
    DuplicateEntity { id: String },

    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Concurrent update lost after {attempts} attempts: {id}")]
    Contention { id: String, attempts: u32 },

    #[error("Invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("Storage write failed: {0}")]
    StorageWriteFailure(String),

    #[error("Relationship target does not exist: {id}")]
    MissingEndpoint { id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("Repository not initialized for engram (run `engram init`)")]
    NotInitialized,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CoreError {
    /// Contention is the only error callers are expected to retry on.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Contention { .. })
    }
}
