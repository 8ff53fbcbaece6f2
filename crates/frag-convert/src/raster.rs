use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::{ConvertError, ConvertResult};

/// Image codec for a base media type.
pub fn format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Decode `data` as `from` and re-encode the pixels as `to`.
///
/// Metadata such as EXIF is not carried over. JPEG has no alpha channel, so
/// transparent pixels are flattened.
pub fn transcode(data: &[u8], from: &str, to: &str) -> ConvertResult<Vec<u8>> {
    let source = format_for_mime(from).ok_or_else(|| unsupported(from, to))?;
    let target = format_for_mime(to).ok_or_else(|| unsupported(from, to))?;

    let decoded = image::load_from_memory_with_format(data, source)?;
    let pixels = match target {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    pixels.write_to(&mut out, target)?;
    Ok(out.into_inner())
}

fn unsupported(from: &str, to: &str) -> ConvertError {
    ConvertError::Unsupported {
        from: from.to_string(),
        to: to.to_string(),
    }
}
