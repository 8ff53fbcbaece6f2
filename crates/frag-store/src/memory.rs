use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyValueStore, StoreKey};

type OwnerMap<V> = HashMap<String, BTreeMap<String, V>>;

/// In-memory, map-based store.
///
/// Values live in a two-level map (owner → id → value) behind a single
/// `RwLock`, so every operation is one critical section. Values are cloned on
/// read. Nothing is evicted and nothing survives the process.
pub struct MemoryStore<V> {
    entries: RwLock<OwnerMap<V>>,
}

impl<V> MemoryStore<V> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, OwnerMap<V>>> {
        self.entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, OwnerMap<V>>> {
        self.entries
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Run a read-only inspection. Inspection helpers are best-effort: a
    /// poisoned lock is logged and reads as an empty store, while the
    /// [`KeyValueStore`] operations report [`StoreError::LockPoisoned`].
    fn inspect<T: Default>(&self, f: impl FnOnce(&OwnerMap<V>) -> T) -> T {
        match self.read_map() {
            Ok(map) => f(&map),
            Err(e) => {
                warn!(error = %e, "memory store: inspecting poisoned map");
                T::default()
            }
        }
    }

    /// Number of values across all owners (best-effort).
    pub fn len(&self) -> usize {
        self.inspect(|map| map.values().map(BTreeMap::len).sum())
    }

    /// Returns `true` if no owner has any value (best-effort).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owners that currently hold at least one value, sorted (best-effort).
    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.inspect(|map| map.keys().cloned().collect());
        owners.sort();
        owners
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> KeyValueStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, key: &StoreKey, value: V) -> StoreResult<()> {
        let mut map = self.write_map()?;
        map.entry(key.owner.clone())
            .or_default()
            .insert(key.id.clone(), value);
        Ok(())
    }

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<V>> {
        let map = self.read_map()?;
        Ok(map
            .get(&key.owner)
            .and_then(|ids| ids.get(&key.id))
            .cloned())
    }

    async fn query(&self, owner: &str) -> StoreResult<Vec<V>> {
        let map = self.read_map()?;
        Ok(map
            .get(owner)
            .map(|ids| ids.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn keys(&self, owner: &str) -> StoreResult<Vec<String>> {
        let map = self.read_map()?;
        Ok(map
            .get(owner)
            .map(|ids| ids.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        let mut map = self.write_map()?;
        if let Some(ids) = map.get_mut(&key.owner) {
            ids.remove(&key.id);
            if ids.is_empty() {
                map.remove(&key.owner);
            }
        }
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.write_map()?.clear();
        Ok(())
    }
}

impl<V> std::fmt::Debug for MemoryStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("value_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(owner: &str, id: &str) -> StoreKey {
        StoreKey::new(owner, id)
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        store.put(&key("a", "b"), 123).await.unwrap();
        assert_eq!(store.get(&key("a", "b")).await.unwrap(), Some(123));
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = MemoryStore::new();
        store.put(&key("a", "b"), "one").await.unwrap();
        store.put(&key("a", "b"), "two").await.unwrap();
        assert_eq!(store.get(&key("a", "b")).await.unwrap(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store: MemoryStore<u32> = MemoryStore::new();
        assert!(store.get(&key("a", "b")).await.unwrap().is_none());
        store.put(&key("a", "c"), 1).await.unwrap();
        assert!(store.get(&key("a", "b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_returns_owner_values_only() {
        let store = MemoryStore::new();
        store.put(&key("a", "1"), "a1").await.unwrap();
        store.put(&key("a", "2"), "a2").await.unwrap();
        store.put(&key("b", "1"), "b1").await.unwrap();

        assert_eq!(store.query("a").await.unwrap(), vec!["a1", "a2"]);
        assert_eq!(store.query("b").await.unwrap(), vec!["b1"]);
    }

    #[tokio::test]
    async fn query_unknown_owner_is_empty() {
        let store: MemoryStore<u8> = MemoryStore::new();
        assert!(store.query("nobody").await.unwrap().is_empty());
        assert!(store.keys("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_match_query_order() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store.put(&key("o", id), id.to_uppercase()).await.unwrap();
        }
        assert_eq!(store.keys("o").await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.query("o").await.unwrap(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put(&key("a", "b"), 1).await.unwrap();
        store.delete(&key("a", "b")).await.unwrap();
        assert!(store.get(&key("a", "b")).await.unwrap().is_none());
        store.delete(&key("a", "b")).await.unwrap();
        store.delete(&key("x", "y")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_prunes_empty_owner() {
        let store = MemoryStore::new();
        store.put(&key("a", "1"), 1).await.unwrap();
        store.put(&key("b", "1"), 1).await.unwrap();
        store.delete(&key("a", "1")).await.unwrap();
        assert_eq!(store.owners(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn clear_removes_all() {
        let store = MemoryStore::new();
        store.put(&key("a", "1"), 1).await.unwrap();
        store.put(&key("b", "1"), 2).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.is_empty());
        assert!(store.query("a").await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_same_owner() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.put(&key("shared", &format!("{i:02}")), i).await.unwrap();
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.keys("shared").await.unwrap().len(), 32);
    }

    proptest::proptest! {
        #[test]
        fn owners_never_see_each_others_values(
            entries in proptest::collection::vec(
                ("[ab]", "[a-z0-9]{1,6}", proptest::prelude::any::<u32>()),
                0..40,
            )
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                let mut expected: std::collections::BTreeMap<(String, String), u32> =
                    Default::default();
                for (owner, id, value) in &entries {
                    store.put(&key(owner, id), *value).await.unwrap();
                    expected.insert((owner.clone(), id.clone()), *value);
                }
                for owner in ["a", "b"] {
                    let want: Vec<u32> = expected
                        .iter()
                        .filter(|((o, _), _)| o == owner)
                        .map(|(_, v)| *v)
                        .collect();
                    assert_eq!(store.query(owner).await.unwrap(), want);
                    assert_eq!(store.keys(owner).await.unwrap().len(), want.len());
                }
            });
        }
    }

    #[test]
    fn poisoned_lock_fails_operations_but_not_inspection() {
        let store = Arc::new(MemoryStore::new());
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(store.put(&key("a", "1"), 1)).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the map");
        })
        .join();

        assert_eq!(store.len(), 0);
        assert!(store.owners().is_empty());
        let err = rt.block_on(store.get(&key("a", "1"))).unwrap_err();
        assert!(matches!(err, StoreError::LockPoisoned(_)));
    }

    #[test]
    fn debug_format() {
        let store: MemoryStore<u8> = MemoryStore::default();
        let debug = format!("{store:?}");
        assert!(debug.contains("MemoryStore"));
        assert!(debug.contains("value_count"));
    }
}
