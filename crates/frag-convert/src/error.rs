use frag_types::TypeError;

/// Errors from conversion lookups and transforms.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The target type is not in the source type's conversion set.
    #[error("cannot convert {from} to {to}")]
    Unsupported { from: String, to: String },

    /// No media type is registered for the requested extension.
    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    /// The source or target value is not a valid media type.
    #[error(transparent)]
    InvalidType(#[from] TypeError),

    /// Decoding or re-encoding image data failed.
    #[error("image conversion failed: {0}")]
    Image(String),

    /// Textual source data is not valid UTF-8.
    #[error("source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl From<image::ImageError> for ConvertError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Result alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
