use chrono::{DateTime, Utc};
use frag_store::StoreKey;
use frag_types::{FragmentId, MediaType, OwnerId};
use serde::{Deserialize, Serialize};

use crate::error::{FragmentError, FragmentResult};

/// Input for constructing a [`FragmentRecord`].
///
/// Only the owner and type are required. A missing id is generated, a
/// missing creation time is "now", and a missing size is 0.
#[derive(Clone, Debug)]
pub struct NewFragment {
    pub owner_id: OwnerId,
    pub content_type: String,
    pub id: Option<FragmentId>,
    pub created: Option<DateTime<Utc>>,
    pub size: Option<u64>,
}

impl NewFragment {
    pub fn new(owner_id: OwnerId, content_type: impl Into<String>) -> Self {
        Self {
            owner_id,
            content_type: content_type.into(),
            id: None,
            created: None,
            size: None,
        }
    }

    pub fn with_id(mut self, id: FragmentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Metadata for one fragment.
///
/// `id`, `owner_id`, `created` and the base of `content_type` never change
/// once the record exists. `size` tracks the most recently written data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRecord {
    pub id: FragmentId,
    pub owner_id: OwnerId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
}

impl FragmentRecord {
    /// Validate `input` and build a record. Nothing is persisted.
    pub fn new(input: NewFragment) -> FragmentResult<Self> {
        if input.content_type.trim().is_empty() {
            return Err(FragmentError::Validation("type is required".into()));
        }
        let media = MediaType::parse(&input.content_type)?;
        if !media.is_supported() {
            return Err(FragmentError::UnsupportedType(input.content_type));
        }

        let created = input.created.unwrap_or_else(Utc::now);
        Ok(Self {
            id: input.id.unwrap_or_default(),
            owner_id: input.owner_id,
            created,
            updated: created,
            content_type: input.content_type,
            size: input.size.unwrap_or(0),
        })
    }

    /// Address of this fragment's metadata and data.
    pub fn key(&self) -> StoreKey {
        StoreKey::new(self.owner_id.as_str(), self.id.as_str())
    }

    /// Base type with parameters stripped, e.g. `text/plain`.
    pub fn mime_type(&self) -> String {
        match MediaType::parse(&self.content_type) {
            Ok(media) => media.essence().to_string(),
            Err(_) => self
                .content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.mime_type().starts_with("text/")
    }

    /// Base types this fragment can be rendered as.
    pub fn formats(&self) -> &'static [&'static str] {
        frag_convert::conversion_targets(&self.mime_type())
    }

    /// Returns `true` if `value`'s base type may be stored at all.
    pub fn is_supported_type(value: &str) -> bool {
        frag_types::is_supported_type(value)
    }

    /// Refresh `updated` to the current time.
    pub fn touch(&mut self) {
        // Never move backwards, even if the clock does.
        self.updated = Utc::now().max(self.updated);
    }
}
