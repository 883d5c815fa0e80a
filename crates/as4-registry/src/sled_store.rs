//! # Durable Keyed Store
//!
//! A [`KeyedStore`] backed by Sled, an embedded database. Values are stored
//! as JSON, one Sled tree per registry, so the PMode, MPC and duplicate
//! registries can share a single database directory.
//!
//! ## Storage Structure
//!
//! | Tree | Key | Value |
//! |------|-----|-------|
//! | `pmodes` | PMode id | serialized `PMode` |
//! | `mpcs` | MPC id | serialized `Mpc` |
//! | `duplicates` | message id | serialized `DuplicateItem` |
//!
//! ## Atomicity
//!
//! `insert_if_absent` and `remove_if` use Sled's compare-and-swap, so the
//! duplicate cache keeps its single-winner guarantee on disk as well as in
//! memory.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;

use crate::error::StoreError;
use crate::store::{KeyedStore, StoreResult};

/// Tree name for PModes.
pub const PMODE_TREE: &str = "pmodes";

/// Tree name for message partition channels.
pub const MPC_TREE: &str = "mpcs";

/// Tree name for duplicate-detection items.
pub const DUPLICATE_TREE: &str = "duplicates";

/// Sled-backed store for one registry.
///
/// # Example
///
/// ```rust
/// use as4_registry::sled_store::SledStore;
/// use as4_registry::KeyedStore;
///
/// let db = sled::Config::new().temporary(true).open().unwrap();
/// let store: SledStore<String> = SledStore::from_db(&db, "example").unwrap();
///
/// store.put("key", "value".to_string()).unwrap();
/// assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
/// ```
pub struct SledStore<V> {
    /// The underlying Sled database.
    db: sled::Db,

    /// Tree holding this registry's entries.
    tree: sled::Tree,

    _values: PhantomData<fn() -> V>,
}

impl<V> Clone for SledStore<V> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            tree: self.tree.clone(),
            _values: PhantomData,
        }
    }
}

impl<V> SledStore<V> {
    /// Opens or creates a database at `path` and uses tree `tree_name`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the path is unusable or the
    /// database is corrupted.
    pub fn open<P: AsRef<Path>>(path: P, tree_name: &str) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db, tree_name)
    }

    /// Uses tree `tree_name` of an already open database.
    pub fn from_db(db: &sled::Db, tree_name: &str) -> StoreResult<Self> {
        let tree = db.open_tree(tree_name)?;
        Ok(Self {
            db: db.clone(),
            tree,
            _values: PhantomData,
        })
    }

    /// In-memory database, discarded on drop. For tests.
    pub fn temporary(tree_name: &str) -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db, tree_name)
    }

    /// Flushes pending writes to disk, returning the number of bytes flushed.
    pub fn flush(&self) -> StoreResult<usize> {
        Ok(self.db.flush()?)
    }
}

impl<V: DeserializeOwned> SledStore<V> {
    fn decode(bytes: &[u8]) -> StoreResult<V> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn decode_opt(bytes: Option<sled::IVec>) -> StoreResult<Option<V>> {
        bytes.map(|b| Self::decode(&b)).transpose()
    }
}

impl<V> KeyedStore<V> for SledStore<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    fn put(&self, key: &str, value: V) -> StoreResult<Option<V>> {
        let bytes = serde_json::to_vec(&value)?;
        let previous = self.tree.insert(key.as_bytes(), bytes)?;
        Self::decode_opt(previous)
    }

    fn get(&self, key: &str) -> StoreResult<Option<V>> {
        Self::decode_opt(self.tree.get(key.as_bytes())?)
    }

    fn delete(&self, key: &str) -> StoreResult<Option<V>> {
        Self::decode_opt(self.tree.remove(key.as_bytes())?)
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.tree.contains_key(key.as_bytes())?)
    }

    fn insert_if_absent(&self, key: &str, value: V) -> StoreResult<bool> {
        let bytes = serde_json::to_vec(&value)?;
        let swapped = self
            .tree
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(bytes))?;
        Ok(swapped.is_ok())
    }

    fn remove_if(&self, key: &str, predicate: &dyn Fn(&V) -> bool) -> StoreResult<Option<V>> {
        loop {
            let current = match self.tree.get(key.as_bytes())? {
                Some(bytes) => bytes,
                None => return Ok(None),
            };
            let value = Self::decode(&current)?;
            if !predicate(&value) {
                return Ok(None);
            }
            // Retry if the entry changed between read and swap.
            let swapped = self
                .tree
                .compare_and_swap(key.as_bytes(), Some(&current), None::<&[u8]>)?;
            if swapped.is_ok() {
                return Ok(Some(value));
            }
        }
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, &V)) -> StoreResult<()> {
        for result in self.tree.iter() {
            let (key, bytes) = result?;
            let key = std::str::from_utf8(&key).map_err(|_| StoreError::InvalidKey)?;
            let value = Self::decode(&bytes)?;
            f(key, &value);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn clear(&self) -> StoreResult<()> {
        Ok(self.tree.clear()?)
    }
}

impl<V> std::fmt::Debug for SledStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("entries", &self.tree.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_store() {
        let store: SledStore<u32> = SledStore::temporary("t").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let store: SledStore<String> = SledStore::temporary("t").unwrap();
        assert_eq!(store.put("k", "v1".to_string()).unwrap(), None);
        assert_eq!(store.put("k", "v2".to_string()).unwrap().as_deref(), Some("v1"));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_insert_if_absent_uses_cas() {
        let store: SledStore<u32> = SledStore::temporary("t").unwrap();
        assert!(store.insert_if_absent("k", 1).unwrap());
        assert!(!store.insert_if_absent("k", 2).unwrap());
        assert_eq!(store.get("k").unwrap(), Some(1));
    }

    #[test]
    fn test_remove_if() {
        let store: SledStore<u32> = SledStore::temporary("t").unwrap();
        store.put("k", 7).unwrap();
        assert_eq!(store.remove_if("k", &|v| *v > 10).unwrap(), None);
        assert!(store.contains("k").unwrap());
        assert_eq!(store.remove_if("k", &|v| *v == 7).unwrap(), Some(7));
        assert!(!store.contains("k").unwrap());
    }

    #[test]
    fn test_trees_are_isolated() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let a: SledStore<u32> = SledStore::from_db(&db, "a").unwrap();
        let b: SledStore<u32> = SledStore::from_db(&db, "b").unwrap();
        a.put("k", 1).unwrap();
        assert!(b.get("k").unwrap().is_none());
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 0);
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let store: SledStore<String> = SledStore::open(&path, PMODE_TREE).unwrap();
            store.put("pm-1", "agreement".to_string()).unwrap();
            store.flush().unwrap();
        }
        let store: SledStore<String> = SledStore::open(&path, PMODE_TREE).unwrap();
        assert_eq!(store.get("pm-1").unwrap().as_deref(), Some("agreement"));
    }

    #[test]
    fn test_for_each_visits_all() {
        let store: SledStore<u32> = SledStore::temporary("t").unwrap();
        store.put("a", 1).unwrap();
        store.put("b", 2).unwrap();
        let mut keys = Vec::new();
        store.for_each(&mut |k, _| keys.push(k.to_string())).unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
