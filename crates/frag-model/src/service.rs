use bytes::Bytes;
use frag_convert::Converted;
use frag_store::{KeyValueStore, StoreKey};
use frag_types::{FragmentId, MediaType, OwnerId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FragmentError, FragmentResult, Phase};
use crate::fragment::{FragmentRecord, NewFragment};
use crate::stores::FragmentStores;

/// Result of [`FragmentService::list_by_owner`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FragmentList {
    Ids(Vec<FragmentId>),
    Records(Vec<FragmentRecord>),
}

impl FragmentList {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The listed ids, whichever form the list is in.
    pub fn ids(&self) -> Vec<FragmentId> {
        match self {
            Self::Ids(ids) => ids.clone(),
            Self::Records(records) => records.iter().map(|r| r.id.clone()).collect(),
        }
    }
}

/// Fragment use cases on top of a [`FragmentStores`] pair.
///
/// # Two-step writes
///
/// Metadata and data live in separate stores and nothing spans both. A data
/// write stores metadata first, then the blob; a delete removes the blob
/// first, then the metadata. When the second step fails the error says which
/// step already landed ([`FragmentError::PartialWrite`],
/// [`FragmentError::PartialDelete`]). Nothing is rolled back.
#[derive(Clone, Debug)]
pub struct FragmentService {
    stores: FragmentStores,
}

impl FragmentService {
    pub fn new(stores: FragmentStores) -> Self {
        Self { stores }
    }

    pub fn memory() -> Self {
        Self::new(FragmentStores::memory())
    }

    pub fn stores(&self) -> &FragmentStores {
        &self.stores
    }

    // ---- Metadata ----

    /// Validate and persist a new, empty fragment.
    pub async fn create(&self, owner: &OwnerId, content_type: &str) -> FragmentResult<FragmentRecord> {
        self.create_with(NewFragment::new(owner.clone(), content_type))
            .await
    }

    pub async fn create_with(&self, input: NewFragment) -> FragmentResult<FragmentRecord> {
        let record = FragmentRecord::new(input)?;
        self.stores
            .metadata
            .put(&record.key(), record.clone())
            .await?;
        debug!(owner = %record.owner_id, id = %record.id, content_type = %record.content_type, "fragment created");
        Ok(record)
    }

    /// Metadata for one fragment, or `None` if the owner has no such id.
    pub async fn get_by_id(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> FragmentResult<Option<FragmentRecord>> {
        let key = StoreKey::new(owner.as_str(), id.as_str());
        Ok(self.stores.metadata.get(&key).await?)
    }

    /// Every fragment the owner has, as ids or as full records.
    pub async fn list_by_owner(&self, owner: &OwnerId, expand: bool) -> FragmentResult<FragmentList> {
        if expand {
            let records = self.stores.metadata.query(owner.as_str()).await?;
            return Ok(FragmentList::Records(records));
        }
        let ids = self
            .stores
            .metadata
            .keys(owner.as_str())
            .await?
            .into_iter()
            .map(FragmentId::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FragmentList::Ids(ids))
    }

    /// Refresh `updated` and write the metadata only.
    pub async fn save(&self, record: &mut FragmentRecord) -> FragmentResult<()> {
        record.touch();
        self.stores
            .metadata
            .put(&record.key(), record.clone())
            .await?;
        Ok(())
    }

    // ---- Data ----

    /// Record `data` as the fragment's content: metadata first, then blob.
    pub async fn set_data(&self, record: &mut FragmentRecord, data: Bytes) -> FragmentResult<()> {
        if data.is_empty() {
            return Err(FragmentError::EmptyData);
        }
        let mut updated = record.clone();
        updated.size = data.len() as u64;
        self.save(&mut updated).await?;
        *record = updated;

        let key = record.key();
        if let Err(source) = self.stores.blobs.put(&key, data).await {
            warn!(owner = %key.owner, id = %key.id, error = %source, "metadata written but data write failed");
            return Err(FragmentError::PartialWrite {
                committed: Phase::Metadata,
                source,
            });
        }
        debug!(owner = %key.owner, id = %key.id, size = record.size, "fragment data written");
        Ok(())
    }

    pub async fn get_data(&self, record: &FragmentRecord) -> FragmentResult<Bytes> {
        let key = record.key();
        self.stores
            .blobs
            .get(&key)
            .await?
            .ok_or_else(|| FragmentError::DataNotFound {
                owner: key.owner,
                id: key.id,
            })
    }

    /// Replace an existing fragment's data. The base type must match.
    pub async fn replace_data(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        content_type: &str,
        data: Bytes,
    ) -> FragmentResult<FragmentRecord> {
        let requested = MediaType::parse(content_type)?;
        let mut record = self
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| FragmentError::not_found(owner.as_str(), id.as_str()))?;

        let existing = MediaType::parse(&record.content_type)?;
        if !requested.same_essence(&existing) {
            return Err(FragmentError::TypeMismatch {
                existing: existing.essence().to_string(),
                requested: requested.essence().to_string(),
            });
        }

        self.set_data(&mut record, data).await?;
        Ok(record)
    }

    /// Remove the fragment's data, then its metadata.
    pub async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> FragmentResult<()> {
        let key = StoreKey::new(owner.as_str(), id.as_str());
        if self.stores.metadata.get(&key).await?.is_none() {
            return Err(FragmentError::not_found(owner.as_str(), id.as_str()));
        }

        self.stores.blobs.delete(&key).await?;
        if let Err(source) = self.stores.metadata.delete(&key).await {
            warn!(owner = %key.owner, id = %key.id, error = %source, "data removed but metadata removal failed");
            return Err(FragmentError::PartialDelete {
                removed: Phase::Blob,
                source,
            });
        }
        debug!(owner = %key.owner, id = %key.id, "fragment deleted");
        Ok(())
    }

    // ---- Conversion ----

    /// Render `data` (the content of `record`) as the type registered for
    /// `extension`.
    pub fn convert(
        &self,
        record: &FragmentRecord,
        data: Bytes,
        extension: &str,
    ) -> FragmentResult<Converted> {
        Ok(frag_convert::convert_to_extension(
            &record.content_type,
            data,
            extension,
        )?)
    }

    /// Fetch a fragment and its data, converted when `extension` is given.
    ///
    /// An illegal conversion is rejected before the data is read.
    pub async fn get_converted(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        extension: Option<&str>,
    ) -> FragmentResult<(FragmentRecord, Converted)> {
        let record = self
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| FragmentError::not_found(owner.as_str(), id.as_str()))?;

        let Some(extension) = extension else {
            let data = self.get_data(&record).await?;
            let media_type = record.content_type.clone();
            return Ok((record, Converted { data, media_type }));
        };

        let target = frag_convert::mime_for_extension(extension)?;
        if !record.formats().contains(&target) {
            return Err(frag_convert::ConvertError::Unsupported {
                from: record.mime_type(),
                to: target.to_string(),
            }
            .into());
        }
        let data = self.get_data(&record).await?;
        let converted = self.convert(&record, data, extension)?;
        Ok((record, converted))
    }

    /// Empty both stores.
    pub async fn reset(&self) -> FragmentResult<()> {
        self.stores.metadata.clear().await?;
        self.stores.blobs.clear().await?;
        Ok(())
    }
}
