//! # Persistence Boundary
//!
//! Every registry is written against [`KeyedStore`]. [`MemoryStore`] is the
//! reference implementation; [`SledStore`](crate::sled_store::SledStore) is a
//! durable drop-in.
//!
//! `insert_if_absent` and `remove_if` must each be a single atomic step per
//! key: the duplicate cache relies on them to serialize check-and-register
//! against eviction.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait KeyedStore<V>: Send + Sync {
    /// Stores `value`, returning the previous value.
    fn put(&self, key: &str, value: V) -> StoreResult<Option<V>>;

    fn get(&self, key: &str) -> StoreResult<Option<V>>;

    /// Removes the entry, returning it.
    fn delete(&self, key: &str) -> StoreResult<Option<V>>;

    fn contains(&self, key: &str) -> StoreResult<bool>;

    /// Atomically stores `value` unless the key is present. Returns true if
    /// the value was stored.
    fn insert_if_absent(&self, key: &str, value: V) -> StoreResult<bool>;

    /// Atomically removes the entry if `predicate` holds for it.
    fn remove_if(&self, key: &str, predicate: &dyn Fn(&V) -> bool) -> StoreResult<Option<V>>;

    /// Visits every entry. `f` must not write to the same store.
    fn for_each(&self, f: &mut dyn FnMut(&str, &V)) -> StoreResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self) -> StoreResult<()>;
}

/// In-memory store on a sharded concurrent map. Operations on different
/// keys rarely contend.
#[derive(Debug)]
pub struct MemoryStore<V> {
    map: DashMap<String, V>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Infallible insert used to seed a fresh store.
    pub fn seed(&self, key: &str, value: V) {
        self.map.insert(key.to_string(), value);
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> KeyedStore<V> for MemoryStore<V> {
    fn put(&self, key: &str, value: V) -> StoreResult<Option<V>> {
        Ok(self.map.insert(key.to_string(), value))
    }

    fn get(&self, key: &str) -> StoreResult<Option<V>> {
        Ok(self.map.get(key).map(|v| v.value().clone()))
    }

    fn delete(&self, key: &str) -> StoreResult<Option<V>> {
        Ok(self.map.remove(key).map(|(_, v)| v))
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.map.contains_key(key))
    }

    fn insert_if_absent(&self, key: &str, value: V) -> StoreResult<bool> {
        match self.map.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    fn remove_if(&self, key: &str, predicate: &dyn Fn(&V) -> bool) -> StoreResult<Option<V>> {
        Ok(self.map.remove_if(key, |_, v| predicate(v)).map(|(_, v)| v))
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, &V)) -> StoreResult<()> {
        for entry in self.map.iter() {
            f(entry.key(), entry.value());
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&self) -> StoreResult<()> {
        self.map.clear();
        Ok(())
    }
}
