//! Owner-scoped key/value storage for the fragment service.
//!
//! Every value is addressed by a [`StoreKey`], an `(owner, id)` pair, and
//! every listing is scoped to a single owner. The same contract stores both
//! fragment metadata and raw fragment bytes; the two always live in separate
//! store instances.
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`MemoryStore`] -- process-local two-level map, lost on restart
//! - [`DurableRecordStore`] -- structured records on a [`RecordService`]
//!   (SQLite via [`SqliteRecordService`])
//! - [`DurableBlobStore`] -- raw bytes on an [`ObjectService`]
//!   (local filesystem via [`FsObjectService`]), addressed as `{owner}/{id}`
//!
//! # Design Rules
//!
//! 1. `get` of a missing key is `Ok(None)`, never an error.
//! 2. `delete` is idempotent.
//! 3. `query` and `keys` agree on ids and order (ascending id).
//! 4. Backend failures are logged with the operation and key, then
//!    propagated unchanged. Nothing here retries.

pub mod durable;
pub mod error;
pub mod memory;
pub mod object;
pub mod record;
pub mod traits;

pub use durable::{DurableBlobStore, DurableRecordStore};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use object::{FsObjectService, ObjectBody, ObjectService};
pub use record::{Projection, RecordItem, RecordService, SqliteRecordService};
pub use traits::{KeyValueStore, StoreKey};
