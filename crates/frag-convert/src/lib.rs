//! Content conversion for stored fragments.
//!
//! A fragment can only be rendered as the base types its source type lists
//! in the conversion table. Everything else is rejected before any bytes
//! are touched.
//!
//! # Conversions
//!
//! | Source            | Targets                                         |
//! |-------------------|-------------------------------------------------|
//! | `text/plain`      | `text/plain`                                    |
//! | `text/markdown`   | `text/markdown`, `text/html`, `text/plain`      |
//! | `text/html`       | `text/html`                                     |
//! | `application/json`| `application/json`                              |
//! | `image/*`         | `image/png`, `image/jpeg`, `image/webp`, `image/gif` |
//!
//! Identity conversions hand back the original bytes. Conversions operate
//! on a whole in-memory payload.

pub mod error;
pub mod extension;
pub mod markdown;
pub mod raster;
pub mod table;

use bytes::Bytes;
use frag_types::MediaType;
use tracing::debug;

pub use error::{ConvertError, ConvertResult};
pub use extension::{extension_for_mime, mime_for_extension};
pub use table::{can_convert, conversion_targets};

/// Output of a successful conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converted {
    pub data: Bytes,
    /// Full content type of `data`, parameters included.
    pub media_type: String,
}

/// Convert `data` of type `source` into the base type `target`.
///
/// `source` may carry parameters; `target` is compared by base type only.
pub fn convert(source: &str, data: Bytes, target: &str) -> ConvertResult<Converted> {
    let from = MediaType::parse(source)?;
    let to = MediaType::parse(target)?;
    let (from_essence, to_essence) = (from.essence(), to.essence());

    if !can_convert(from_essence, to_essence) {
        return Err(ConvertError::Unsupported {
            from: from_essence.to_string(),
            to: to_essence.to_string(),
        });
    }

    if from_essence == to_essence {
        return Ok(Converted {
            data,
            media_type: source.to_string(),
        });
    }

    debug!(from = from_essence, to = to_essence, size = data.len(), "convert");
    let out = match (from_essence, to_essence) {
        ("text/markdown", "text/html") => {
            Bytes::from(markdown::to_html(std::str::from_utf8(&data)?))
        }
        ("text/markdown", "text/plain") => {
            Bytes::from(markdown::to_plain_text(std::str::from_utf8(&data)?))
        }
        _ if from.is_image() && to.is_image() => {
            Bytes::from(raster::transcode(&data, from_essence, to_essence)?)
        }
        _ => {
            return Err(ConvertError::Unsupported {
                from: from_essence.to_string(),
                to: to_essence.to_string(),
            })
        }
    };

    let media_type = if to.is_text() {
        format!("{to_essence}; charset=utf-8")
    } else {
        to_essence.to_string()
    };
    Ok(Converted {
        data: out,
        media_type,
    })
}

/// Convert `data` to the type registered for file extension `ext`.
pub fn convert_to_extension(source: &str, data: Bytes, ext: &str) -> ConvertResult<Converted> {
    let target = mime_for_extension(ext)?;
    convert(source, data, target)
}
