//! Fragments and the service that manages them.
//!
//! A fragment is a metadata record ([`FragmentRecord`]) paired with an
//! opaque blob of bytes. The two halves live in separate stores
//! ([`FragmentStores`]) keyed by the same `(owner, id)` pair.
//! [`FragmentService`] is the only thing that writes to either.
//!
//! # Design Rules
//!
//! 1. A record's id, owner, creation time and base type never change.
//! 2. `size` equals the length of the last data written, or 0.
//! 3. Reads of a missing record return `None`; operations that need one
//!    fail with [`FragmentError::NotFound`].
//! 4. Data writes and deletes are two steps with no rollback. Partial
//!    completion is reported, never hidden.

pub mod error;
pub mod fragment;
pub mod service;
pub mod stores;

pub use error::{FragmentError, FragmentResult, Phase};
pub use fragment::{FragmentRecord, NewFragment};
pub use frag_convert::Converted;
pub use service::{FragmentList, FragmentService};
pub use stores::{FragmentStores, StoreConfig};
