//! Foundation types for the fragment storage service.
//!
//! Every other `frag-*` crate depends on `frag-types`. The types here carry
//! no storage or conversion behaviour of their own.
//!
//! # Key Types
//!
//! - [`FragmentId`] -- generated, immutable fragment identifier
//! - [`OwnerId`] -- opaque identifier scoping all lookups and listings
//! - [`MediaType`] -- parsed `Content-Type` value (base type + parameters)

pub mod error;
pub mod ids;
pub mod media;

pub use error::TypeError;
pub use ids::{FragmentId, OwnerId};
pub use media::{is_supported_type, MediaType, SUPPORTED_TYPES};
