use std::fmt;

use frag_convert::ConvertError;
use frag_store::StoreError;
use frag_types::TypeError;

/// One half of a two-step fragment write or delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Metadata,
    Blob,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            Self::Blob => f.write_str("blob"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// Construction input was missing or malformed.
    #[error("invalid fragment: {0}")]
    Validation(String),

    #[error("unsupported fragment type: {0}")]
    UnsupportedType(String),

    #[error("fragment not found: {id}")]
    NotFound { owner: String, id: String },

    /// The metadata exists but no data was ever written for it.
    #[error("fragment has no data: {id}")]
    DataNotFound { owner: String, id: String },

    /// A write tried to change the fragment's base type.
    #[error("fragment type is {existing}, got {requested}")]
    TypeMismatch { existing: String, requested: String },

    #[error("fragment data must not be empty")]
    EmptyData,

    #[error("conversion error: {0}")]
    Conversion(#[from] ConvertError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The first write landed; the second did not. Retry the whole write.
    #[error("{committed} written but the following write failed: {source}")]
    PartialWrite { committed: Phase, source: StoreError },

    /// The first removal landed; the second did not.
    #[error("{removed} removed but the following removal failed: {source}")]
    PartialDelete { removed: Phase, source: StoreError },
}

impl From<TypeError> for FragmentError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl FragmentError {
    pub(crate) fn not_found(owner: &str, id: &str) -> Self {
        Self::NotFound {
            owner: owner.to_string(),
            id: id.to_string(),
        }
    }

    /// `true` for errors a caller should report as "no such fragment".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::DataNotFound { .. })
    }
}

pub type FragmentResult<T> = Result<T, FragmentError>;
