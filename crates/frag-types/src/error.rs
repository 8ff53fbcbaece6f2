use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid fragment id: {0:?}")]
    InvalidFragmentId(String),

    #[error("owner id must not be empty")]
    EmptyOwner,

    #[error("invalid media type: {0:?}")]
    InvalidMediaType(String),
}
