const TEXT_PLAIN: &[&str] = &["text/plain"];
const TEXT_MARKDOWN: &[&str] = &["text/markdown", "text/html", "text/plain"];
const TEXT_HTML: &[&str] = &["text/html"];
const APPLICATION_JSON: &[&str] = &["application/json"];
const IMAGES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Base types a fragment of base type `source` may be rendered as.
///
/// Every listed source includes itself. Unlisted sources have no targets.
pub fn conversion_targets(source: &str) -> &'static [&'static str] {
    match source {
        "text/plain" => TEXT_PLAIN,
        "text/markdown" => TEXT_MARKDOWN,
        "text/html" => TEXT_HTML,
        "application/json" => APPLICATION_JSON,
        "image/png" | "image/jpeg" | "image/webp" | "image/gif" => IMAGES,
        _ => &[],
    }
}

/// Returns `true` if `source` may be rendered as `target` (both base types).
pub fn can_convert(source: &str, target: &str) -> bool {
    conversion_targets(source).contains(&target)
}
