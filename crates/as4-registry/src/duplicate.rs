//! # Duplicate Detection Cache
//!
//! Gives at-most-once processing on top of at-least-once delivery. Each
//! inbound message id is registered exactly once; every later arrival of
//! the same id is reported as a duplicate, which the caller acknowledges
//! without processing.
//!
//! ## Concurrency
//!
//! The check and the insert are one atomic store operation
//! (`insert_if_absent`), so of N concurrent arrivals of one id exactly one
//! sees [`DuplicateCheck::Continue`]. Different ids land on different map
//! shards and do not serialize against each other. Eviction removes entries
//! one key at a time with `remove_if`, so an eviction and a registration of
//! the same id always agree on a single outcome.
//!
//! The dedup key is the message id alone; profile and PMode ids are kept as
//! metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{RegistryError, Result};
use crate::store::{KeyedStore, MemoryStore};

/// Arrival record of a message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateItem {
    /// Deduplication key.
    pub message_id: String,
    /// Profile active at first sighting.
    pub profile_id: String,
    /// PMode the first sighting was attributed to.
    pub pmode_id: String,
    /// First sighting; eviction compares against this.
    pub received_at: DateTime<Utc>,
}

/// Result of [`DuplicateCache::register_and_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateCheck {
    /// First sighting: process the message.
    Continue,
    /// Already seen: acknowledge, do not process.
    Stop,
}

impl DuplicateCheck {
    pub fn is_duplicate(self) -> bool {
        self == DuplicateCheck::Stop
    }
}

pub struct DuplicateCache {
    store: Box<dyn KeyedStore<DuplicateItem>>,
    clock: Arc<dyn Clock>,
}

impl DuplicateCache {
    pub fn new(store: Box<dyn KeyedStore<DuplicateItem>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(Box::new(MemoryStore::new()), clock)
    }

    /// Registers `message_id` if it is new.
    ///
    /// The test and the insert are one atomic store operation, so of any
    /// number of concurrent calls with the same id exactly one sees
    /// `Continue`. Calls for different ids do not contend.
    ///
    /// # Arguments
    ///
    /// * `message_id` - ebMS message id, the deduplication key
    /// * `profile_id` - Profile active when the message arrived
    /// * `pmode_id` - PMode the message was attributed to
    ///
    /// # Returns
    ///
    /// `Continue` on first sighting, `Stop` for a duplicate. A duplicate is
    /// not an error.
    ///
    /// # Errors
    ///
    /// - `RegistryError::EmptyId` for an empty message id; nothing is stored
    /// - `RegistryError::Store` if the store fails
    pub fn register_and_check(
        &self,
        message_id: &str,
        profile_id: &str,
        pmode_id: &str,
    ) -> Result<DuplicateCheck> {
        if message_id.is_empty() {
            return Err(RegistryError::EmptyId("message id"));
        }

        let item = DuplicateItem {
            message_id: message_id.to_string(),
            profile_id: profile_id.to_string(),
            pmode_id: pmode_id.to_string(),
            received_at: self.clock.now(),
        };

        if self.store.insert_if_absent(message_id, item)? {
            debug!(message_id, pmode = pmode_id, "first sighting of message");
            Ok(DuplicateCheck::Continue)
        } else {
            info!(message_id, pmode = pmode_id, "duplicate message");
            Ok(DuplicateCheck::Stop)
        }
    }

    /// Read-only lookup.
    pub fn get_item_of_message_id(&self, message_id: &str) -> Result<Option<DuplicateItem>> {
        Ok(self.store.get(message_id)?)
    }

    /// Snapshot ordered by arrival time, then message id.
    pub fn get_all(&self) -> Result<Vec<DuplicateItem>> {
        let mut items = Vec::with_capacity(self.store.len());
        self.store.for_each(&mut |_, item| items.push(item.clone()))?;
        items.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
        Ok(items)
    }

    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drops every item.
    pub fn clear_cache(&self) -> Result<()> {
        self.store.clear()?;
        info!("duplicate cache cleared");
        Ok(())
    }

    /// Removes every item that arrived strictly before `reference`.
    ///
    /// Each removal re-checks the arrival time atomically, so a concurrent
    /// `register_and_check` on the same id either sees the old item (and
    /// reports `Stop`) or registers a fresh one that survives the sweep.
    ///
    /// # Arguments
    ///
    /// * `reference` - Eviction boundary; items at or after it stay
    ///
    /// # Returns
    ///
    /// The message ids actually evicted.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Store` if the store fails mid-sweep; items
    /// evicted before the failure stay evicted.
    pub fn evict_all_items_before(&self, reference: DateTime<Utc>) -> Result<Vec<String>> {
        let mut candidates = Vec::new();
        self.store.for_each(&mut |id, item| {
            if item.received_at < reference {
                candidates.push(id.to_string());
            }
        })?;

        let mut evicted = Vec::with_capacity(candidates.len());
        for id in candidates {
            // Re-check under the key's lock; the item may have changed.
            if self
                .store
                .remove_if(&id, &|item| item.received_at < reference)?
                .is_some()
            {
                evicted.push(id);
            }
        }

        if !evicted.is_empty() {
            info!(count = evicted.len(), %reference, "evicted duplicate items");
        }
        Ok(evicted)
    }
}

impl std::fmt::Debug for DuplicateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateCache")
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sled_store::{SledStore, DUPLICATE_TREE};
    use chrono::Duration;

    fn cache_with_clock() -> (DuplicateCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (DuplicateCache::in_memory_with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_first_continue_then_stop() {
        let cache = DuplicateCache::in_memory();
        let check = || cache.register_and_check("msg-42", "generic", "A1").unwrap();
        assert_eq!(check(), DuplicateCheck::Continue);
        assert_eq!(check(), DuplicateCheck::Stop);

        let all = cache.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].message_id, "msg-42");
    }

    #[test]
    fn test_stop_regardless_of_metadata() {
        let cache = DuplicateCache::in_memory();
        cache.register_and_check("m", "p1", "A1").unwrap();
        assert!(cache.register_and_check("m", "p2", "A2").unwrap().is_duplicate());

        let item = cache.get_item_of_message_id("m").unwrap().unwrap();
        assert_eq!(item.profile_id, "p1");
        assert_eq!(item.pmode_id, "A1");
    }

    #[test]
    fn test_empty_message_id_rejected_without_mutation() {
        let cache = DuplicateCache::in_memory();
        let err = cache.register_and_check("", "p", "A1").unwrap_err();
        assert!(err.is_contract_violation());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_strictly_before() {
        let (cache, clock) = cache_with_clock();
        let t0 = clock.now();

        cache.register_and_check("old", "p", "A1").unwrap();
        clock.advance(Duration::minutes(5));
        let boundary = clock.now();
        cache.register_and_check("at-boundary", "p", "A1").unwrap();
        clock.advance(Duration::minutes(5));
        cache.register_and_check("new", "p", "A1").unwrap();

        let evicted = cache.evict_all_items_before(boundary).unwrap();
        assert_eq!(evicted, vec!["old".to_string()]);
        assert!(cache.get_item_of_message_id("old").unwrap().is_none());
        assert!(cache.get_item_of_message_id("at-boundary").unwrap().is_some());
        assert!(cache.get_item_of_message_id("new").unwrap().is_some());
        assert_eq!(cache.size(), 2);

        assert!(cache.evict_all_items_before(t0).unwrap().is_empty());
    }

    #[test]
    fn test_evicted_id_is_new_again() {
        let (cache, clock) = cache_with_clock();
        cache.register_and_check("m", "p", "A1").unwrap();
        clock.advance(Duration::minutes(1));
        cache.evict_all_items_before(clock.now()).unwrap();
        assert_eq!(cache.register_and_check("m", "p", "A1").unwrap(), DuplicateCheck::Continue);
    }

    #[test]
    fn test_get_all_ordered_by_arrival() {
        let (cache, clock) = cache_with_clock();
        cache.register_and_check("z", "p", "A1").unwrap();
        clock.advance(Duration::seconds(1));
        cache.register_and_check("a", "p", "A1").unwrap();
        let ids: Vec<_> = cache.get_all().unwrap().into_iter().map(|i| i.message_id).collect();
        assert_eq!(ids, vec!["z".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_clear_cache() {
        let cache = DuplicateCache::in_memory();
        cache.register_and_check("a", "p", "A1").unwrap();
        cache.register_and_check("b", "p", "A1").unwrap();
        cache.clear_cache().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.register_and_check("a", "p", "A1").unwrap(), DuplicateCheck::Continue);
    }

    #[test]
    fn test_sled_backed_cache() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = DuplicateCache::new(
            Box::new(SledStore::temporary(DUPLICATE_TREE).unwrap()),
            clock.clone(),
        );
        assert!(!cache.register_and_check("m", "p", "A1").unwrap().is_duplicate());
        assert!(cache.register_and_check("m", "p", "A1").unwrap().is_duplicate());
        clock.advance(Duration::seconds(1));
        assert_eq!(cache.evict_all_items_before(clock.now()).unwrap(), vec!["m".to_string()]);
        assert!(cache.is_empty());
    }
}
