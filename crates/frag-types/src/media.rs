use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Base media types a fragment may be created with.
pub const SUPPORTED_TYPES: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/html",
    "application/json",
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
];

/// Returns `true` if `value` parses and its base type is in [`SUPPORTED_TYPES`].
///
/// Parameters are ignored: `text/plain; charset=utf-8` is supported because
/// `text/plain` is.
pub fn is_supported_type(value: &str) -> bool {
    MediaType::parse(value)
        .map(|m| m.is_supported())
        .unwrap_or(false)
}

/// A parsed `Content-Type` value.
///
/// Type, subtype and parameter names are lower-cased; parameter values keep
/// their case but lose surrounding quotes. Parameters are kept in the order
/// they were given.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidMediaType(value.to_string());

        let mut parts = value.split(';');
        let base = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let (ty, subtype) = base.split_once('/').ok_or_else(invalid)?;
        if !is_token(ty) || !is_token(subtype) {
            return Err(invalid());
        }

        let mut params = Vec::new();
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, val) = part.split_once('=').ok_or_else(invalid)?;
            let name = name.trim().to_ascii_lowercase();
            if !is_token(&name) {
                return Err(invalid());
            }
            let val = val.trim();
            let val = val
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(val);
            params.push((name, val.to_string()));
        }

        Ok(Self {
            essence: base,
            params,
        })
    }

    /// The base type without parameters, e.g. `text/html`.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// The top-level type, e.g. `text` for `text/html`.
    pub fn top_level(&self) -> &str {
        self.essence
            .split_once('/')
            .map(|(ty, _)| ty)
            .unwrap_or(&self.essence)
    }

    pub fn subtype(&self) -> &str {
        self.essence
            .split_once('/')
            .map(|(_, sub)| sub)
            .unwrap_or_default()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a parameter by (case-insensitive) name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_text(&self) -> bool {
        self.top_level() == "text"
    }

    pub fn is_image(&self) -> bool {
        self.top_level() == "image"
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_TYPES.contains(&self.essence.as_str())
    }

    /// Two media types share a base type, ignoring parameters.
    pub fn same_essence(&self, other: &MediaType) -> bool {
        self.essence == other.essence
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_' | b'.' | b'+')
        })
}

impl FromStr for MediaType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MediaType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaType> for String {
    fn from(m: MediaType) -> Self {
        m.to_string()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.params {
            write!(f, "; {name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_strips_parameters() {
        let m = MediaType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(m.essence(), "text/plain");
        assert_eq!(m.param("charset"), Some("utf-8"));
        assert_eq!(m.param("CHARSET"), Some("utf-8"));
        assert!(m.is_text());
    }

    #[test]
    fn parse_normalizes_case_and_quotes() {
        let m = MediaType::parse("Text/HTML ; Charset=\"UTF-8\"").unwrap();
        assert_eq!(m.essence(), "text/html");
        assert_eq!(m.params(), &[("charset".to_string(), "UTF-8".to_string())]);
        assert_eq!(m.to_string(), "text/html; charset=UTF-8");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(MediaType::parse("").is_err());
        assert!(MediaType::parse("text").is_err());
        assert!(MediaType::parse("text/").is_err());
        assert!(MediaType::parse("/plain").is_err());
        assert!(MediaType::parse("text/plain; charset").is_err());
    }

    #[test]
    fn supported_types() {
        assert!(is_supported_type("text/plain"));
        assert!(is_supported_type("text/plain; charset=utf-8"));
        assert!(is_supported_type("text/markdown"));
        assert!(is_supported_type("application/json"));
        assert!(is_supported_type("image/webp"));
        assert!(!is_supported_type("abc/defg"));
        assert!(!is_supported_type("application/octet-stream"));
        assert!(!is_supported_type("not a type"));
    }

    #[test]
    fn top_level_and_subtype() {
        let m = MediaType::parse("image/png").unwrap();
        assert_eq!(m.top_level(), "image");
        assert_eq!(m.subtype(), "png");
        assert!(m.is_image());
        assert!(!m.is_text());
    }

    #[test]
    fn same_essence_ignores_params() {
        let a = MediaType::parse("text/plain").unwrap();
        let b = MediaType::parse("text/plain; charset=utf-8").unwrap();
        let c = MediaType::parse("text/html").unwrap();
        assert!(a.same_essence(&b));
        assert!(!a.same_essence(&c));
    }

    #[test]
    fn serde_uses_display_form() {
        let m = MediaType::parse("text/plain;charset=utf-8").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"text/plain; charset=utf-8\"");
        let back: MediaType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    proptest! {
        #[test]
        fn display_reparses_to_same_value(
            ty in "[a-z]{1,8}",
            sub in "[a-z0-9+.-]{1,12}",
            charset in proptest::option::of("[a-zA-Z0-9-]{1,10}"),
        ) {
            let raw = match &charset {
                Some(c) => format!("{ty}/{sub}; charset={c}"),
                None => format!("{ty}/{sub}"),
            };
            let parsed = MediaType::parse(&raw).unwrap();
            prop_assert_eq!(parsed.essence(), format!("{ty}/{sub}"));
            let reparsed = MediaType::parse(&parsed.to_string()).unwrap();
            prop_assert_eq!(reparsed, parsed);
        }
    }
}
