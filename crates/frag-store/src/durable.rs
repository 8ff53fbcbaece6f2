//! Durable [`KeyValueStore`] adapters over the record and object services.
//!
//! Metadata goes to a [`RecordService`], blob bytes to an [`ObjectService`].
//! Both adapters log every backend failure with the operation and key before
//! handing the error back unchanged.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectService;
use crate::record::{Projection, RecordService};
use crate::traits::{KeyValueStore, StoreKey};

/// Structured values stored as JSON items in a [`RecordService`].
pub struct DurableRecordStore<V> {
    records: Arc<dyn RecordService>,
    _value: PhantomData<fn() -> V>,
}

impl<V> DurableRecordStore<V> {
    pub fn new(records: Arc<dyn RecordService>) -> Self {
        Self {
            records,
            _value: PhantomData,
        }
    }
}

fn encode<V: Serialize>(key: &StoreKey, value: &V) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode<V: DeserializeOwned>(key: &StoreKey, body: serde_json::Value) -> StoreResult<V> {
    serde_json::from_value(body).map_err(|e| StoreError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn log_failure<'a>(op: &'static str, key: &'a str) -> impl FnOnce(&StoreError) + 'a {
    move |err: &StoreError| error!(op, key, error = %err, "store backend failure")
}

#[async_trait]
impl<V> KeyValueStore<V> for DurableRecordStore<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn put(&self, key: &StoreKey, value: V) -> StoreResult<()> {
        let body = encode(key, &value)?;
        self.records
            .put_item(key, body)
            .await
            .inspect_err(log_failure("metadata.put", &key.to_string()))
    }

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<V>> {
        let item = self
            .records
            .get_item(key)
            .await
            .inspect_err(log_failure("metadata.get", &key.to_string()))?;
        match item.and_then(|item| item.body) {
            Some(body) => decode(key, body).map(Some),
            None => Ok(None),
        }
    }

    async fn query(&self, owner: &str) -> StoreResult<Vec<V>> {
        let items = self
            .records
            .query_items(owner, Projection::All)
            .await
            .inspect_err(log_failure("metadata.query", owner))?;
        items
            .into_iter()
            .filter_map(|item| item.body.map(|body| (item.key, body)))
            .map(|(key, body)| decode(&key, body))
            .collect()
    }

    async fn keys(&self, owner: &str) -> StoreResult<Vec<String>> {
        let items = self
            .records
            .query_items(owner, Projection::IdOnly)
            .await
            .inspect_err(log_failure("metadata.keys", owner))?;
        Ok(items.into_iter().map(|item| item.key.id).collect())
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        self.records
            .delete_item(key)
            .await
            .inspect_err(log_failure("metadata.delete", &key.to_string()))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.records
            .clear()
            .await
            .inspect_err(log_failure("metadata.clear", "*"))
    }
}

/// Raw bytes stored as objects at `{owner}/{id}` in an [`ObjectService`].
pub struct DurableBlobStore {
    objects: Arc<dyn ObjectService>,
}

impl DurableBlobStore {
    pub fn new(objects: Arc<dyn ObjectService>) -> Self {
        Self { objects }
    }

    /// Read an object and materialize it into one buffer. A transport error
    /// midway through discards everything read so far.
    async fn read_object(&self, path: &str) -> StoreResult<Option<Bytes>> {
        let Some(mut body) = self.objects.get_object(path).await? else {
            return Ok(None);
        };
        let mut buf = BytesMut::new();
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| StoreError::backend("get_object", path, e))?
        {
            buf.extend_from_slice(&chunk);
        }
        Ok(Some(buf.freeze()))
    }
}

#[async_trait]
impl KeyValueStore<Bytes> for DurableBlobStore {
    async fn put(&self, key: &StoreKey, value: Bytes) -> StoreResult<()> {
        let path = key.object_path();
        self.objects
            .put_object(&path, value)
            .await
            .inspect_err(log_failure("blob.put", &path))
    }

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Bytes>> {
        let path = key.object_path();
        self.read_object(&path)
            .await
            .inspect_err(log_failure("blob.get", &path))
    }

    async fn query(&self, owner: &str) -> StoreResult<Vec<Bytes>> {
        let mut values = Vec::new();
        for id in self.keys(owner).await? {
            let path = StoreKey::new(owner, id).object_path();
            // An object removed between listing and reading is skipped.
            if let Some(data) = self
                .read_object(&path)
                .await
                .inspect_err(log_failure("blob.query", &path))?
            {
                values.push(data);
            }
        }
        Ok(values)
    }

    async fn keys(&self, owner: &str) -> StoreResult<Vec<String>> {
        self.objects
            .list_objects(owner)
            .await
            .inspect_err(log_failure("blob.keys", owner))
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        let path = key.object_path();
        self.objects
            .delete_object(&path)
            .await
            .inspect_err(log_failure("blob.delete", &path))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.objects
            .clear()
            .await
            .inspect_err(log_failure("blob.clear", "*"))
    }
}
