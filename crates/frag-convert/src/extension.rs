use crate::error::{ConvertError, ConvertResult};

const EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Resolve a file extension (with or without the leading dot) to a base
/// media type. Matching is case-insensitive.
pub fn mime_for_extension(ext: &str) -> ConvertResult<&'static str> {
    let bare = ext.strip_prefix('.').unwrap_or(ext);
    EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(bare))
        .map(|(_, mime)| *mime)
        .ok_or_else(|| ConvertError::UnknownExtension(ext.to_string()))
}

/// Preferred extension for a base media type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    EXTENSIONS
        .iter()
        .find(|(_, known)| *known == mime)
        .map(|(ext, _)| *ext)
}
