use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use frag_store::{
    DurableBlobStore, DurableRecordStore, FsObjectService, KeyValueStore, MemoryStore,
    SqliteRecordService,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FragmentResult;
use crate::fragment::FragmentRecord;

/// Which backend holds fragment metadata and data. Chosen once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process memory. Nothing survives a restart.
    #[default]
    Memory,
    /// SQLite for metadata, a directory tree for data.
    Durable {
        database_path: PathBuf,
        objects_root: PathBuf,
    },
}

/// The metadata and blob store pair a [`FragmentService`](crate::FragmentService)
/// works against.
#[derive(Clone)]
pub struct FragmentStores {
    pub metadata: Arc<dyn KeyValueStore<FragmentRecord>>,
    pub blobs: Arc<dyn KeyValueStore<Bytes>>,
}

impl FragmentStores {
    pub fn new(
        metadata: Arc<dyn KeyValueStore<FragmentRecord>>,
        blobs: Arc<dyn KeyValueStore<Bytes>>,
    ) -> Self {
        Self { metadata, blobs }
    }

    /// Two independent in-memory stores.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// SQLite records at `database_path`, objects under `objects_root`.
    pub fn durable(
        database_path: impl Into<PathBuf>,
        objects_root: impl Into<PathBuf>,
    ) -> FragmentResult<Self> {
        let database_path = database_path.into();
        let records = SqliteRecordService::open(&database_path)?;
        let objects = FsObjectService::new(objects_root);
        Ok(Self::new(
            Arc::new(DurableRecordStore::new(Arc::new(records))),
            Arc::new(DurableBlobStore::new(Arc::new(objects))),
        ))
    }

    pub fn from_config(config: &StoreConfig) -> FragmentResult<Self> {
        match config {
            StoreConfig::Memory => {
                info!("using in-memory fragment store");
                Ok(Self::memory())
            }
            StoreConfig::Durable {
                database_path,
                objects_root,
            } => {
                info!(
                    database = %database_path.display(),
                    objects = %objects_root.display(),
                    "using durable fragment store"
                );
                Self::durable(database_path, objects_root)
            }
        }
    }
}

impl std::fmt::Debug for FragmentStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentStores").finish_non_exhaustive()
    }
}
