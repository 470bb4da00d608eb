/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused or failed the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A persisted value could not be encoded or decoded.
    #[error("serialization error on key {key}: {reason}")]
    Serialization { key: String, reason: String },

    /// A dotted path does not address a known field.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A collection record does not exist.
    #[error("record {id} not found in {collection}")]
    RecordNotFound { collection: String, id: u64 },
}

impl StoreError {
    pub(crate) fn serialization(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
