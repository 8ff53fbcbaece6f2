/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The metadata or object service failed.
    #[error("{op} failed for {key}: {message}")]
    Backend {
        op: &'static str,
        key: String,
        message: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("serialization error for {key}: {message}")]
    Serialization { key: String, message: String },

    /// The key cannot be mapped onto the backend's address space.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A lock guarding in-process state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn backend(op: &'static str, key: impl ToString, err: impl ToString) -> Self {
        Self::Backend {
            op,
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
