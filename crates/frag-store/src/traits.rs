use std::fmt;

use async_trait::async_trait;

use crate::error::StoreResult;

/// Address of a single value: the owning principal plus the value's id.
///
/// Both metadata and blob stores use the same key for the same fragment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub owner: String,
    pub id: String,
}

impl StoreKey {
    pub fn new(owner: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            id: id.into(),
        }
    }

    /// Object-storage address for this key: `{owner}/{id}`.
    pub fn object_path(&self) -> String {
        format!("{}/{}", self.owner, self.id)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.id)
    }
}

/// Owner-scoped key/value store.
///
/// All implementations must satisfy these invariants:
/// - `put` upserts: a second `put` to the same key replaces the value.
/// - `get` returns `Ok(None)` for a missing key.
/// - `query` returns only the given owner's values, ordered by id, and an
///   empty vector (not an error) when the owner has none.
/// - `keys` returns exactly the ids of `query`, in the same order.
/// - `delete` of a missing key succeeds.
#[async_trait]
pub trait KeyValueStore<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    /// Insert or overwrite the value at `key`.
    async fn put(&self, key: &StoreKey, value: V) -> StoreResult<()>;

    /// Read the value at `key`.
    async fn get(&self, key: &StoreKey) -> StoreResult<Option<V>>;

    /// All values stored for `owner`, ordered by id.
    async fn query(&self, owner: &str) -> StoreResult<Vec<V>>;

    /// All ids stored for `owner`, ordered by id.
    ///
    /// Backends that can project a single attribute should do so instead of
    /// materializing full values.
    async fn keys(&self, owner: &str) -> StoreResult<Vec<String>>;

    /// Remove the value at `key`, if any.
    async fn delete(&self, key: &StoreKey) -> StoreResult<()>;

    /// Remove every value for every owner.
    async fn clear(&self) -> StoreResult<()>;
}
