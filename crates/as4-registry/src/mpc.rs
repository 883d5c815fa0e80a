//! # Message Partition Channel Registry
//!
//! Keyed store of the partitions a pull request may retrieve from. The
//! default partition is created with the registry and can never be removed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use as4_model::DEFAULT_MPC_ID;

use crate::error::{RegistryError, Result};
use crate::store::{KeyedStore, MemoryStore};

/// A message partition channel, optionally a sub-channel of another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mpc {
    /// Channel URI.
    pub id: String,
    /// Free text for operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent channel of a sub-channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Mpc {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            parent_id: None,
        }
    }

    pub fn default_mpc() -> Self {
        Self::new(DEFAULT_MPC_ID).with_description("ebMS3 default MPC")
    }

    /// A sub-channel of `parent_id`.
    pub fn sub_channel(parent_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            parent_id: Some(parent_id.into()),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_MPC_ID
    }
}

pub struct MpcManager {
    store: Box<dyn KeyedStore<Mpc>>,
    /// Serializes create/delete so parent checks cannot race.
    write_gate: Mutex<()>,
}

impl MpcManager {
    /// Wraps `store`, creating the default MPC if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Store` if the store cannot be written.
    pub fn new(store: Box<dyn KeyedStore<Mpc>>) -> Result<Self> {
        if store.insert_if_absent(DEFAULT_MPC_ID, Mpc::default_mpc())? {
            info!(mpc = DEFAULT_MPC_ID, "created default MPC");
        }
        Ok(Self {
            store,
            write_gate: Mutex::new(()),
        })
    }

    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        store.seed(DEFAULT_MPC_ID, Mpc::default_mpc());
        Self {
            store: Box::new(store),
            write_gate: Mutex::new(()),
        }
    }

    /// Registers a new MPC.
    ///
    /// # Arguments
    ///
    /// * `mpc` - The channel; `parent_id` must name a registered MPC
    ///
    /// # Errors
    ///
    /// - `EmptyId` for an empty id
    /// - `UnknownParentMpc` if a sub-channel's parent is not registered
    /// - `AlreadyExists` if the id is taken
    pub fn create(&self, mpc: Mpc) -> Result<()> {
        if mpc.id.is_empty() {
            return Err(RegistryError::EmptyId("MPC id"));
        }

        let _gate = self.write_gate.lock();
        if let Some(parent) = &mpc.parent_id {
            if !self.store.contains(parent)? {
                return Err(RegistryError::UnknownParentMpc(parent.clone()));
            }
        }

        let id = mpc.id.clone();
        if !self.store.insert_if_absent(&id, mpc)? {
            return Err(RegistryError::AlreadyExists(id));
        }
        info!(mpc = %id, "created MPC");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RegistryError::Store` if the lookup fails. A failed lookup is
    /// never reported as an unknown MPC.
    pub fn contains_with_id(&self, id: &str) -> Result<bool> {
        Ok(self.store.contains(id)?)
    }

    pub fn get(&self, id: &str) -> Result<Option<Mpc>> {
        Ok(self.store.get(id)?)
    }

    /// Removes an MPC. Returns false if it did not exist.
    ///
    /// PModes are not consulted here; use
    /// [`PModeRegistry::delete_mpc`](crate::PModeRegistry::delete_mpc) to
    /// refuse removal of a channel a stored PMode still names.
    ///
    /// # Errors
    ///
    /// - `DefaultMpcProtected` for the default MPC
    /// - `MpcHasSubChannels` while sub-channels reference it
    pub fn delete(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(RegistryError::EmptyId("MPC id"));
        }
        if id == DEFAULT_MPC_ID {
            return Err(RegistryError::DefaultMpcProtected);
        }

        let _gate = self.write_gate.lock();
        let mut has_children = false;
        self.store.for_each(&mut |_, mpc| {
            has_children |= mpc.parent_id.as_deref() == Some(id);
        })?;
        if has_children {
            return Err(RegistryError::MpcHasSubChannels(id.to_string()));
        }

        let removed = self.store.delete(id)?.is_some();
        if removed {
            info!(mpc = id, "deleted MPC");
        }
        Ok(removed)
    }

    /// Snapshot ordered by id.
    pub fn all(&self) -> Result<Vec<Mpc>> {
        let mut mpcs = Vec::with_capacity(self.store.len());
        self.store.for_each(&mut |_, mpc| mpcs.push(mpc.clone()))?;
        mpcs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(mpcs)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for MpcManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpcManager")
            .field("mpc_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sled_store::{SledStore, MPC_TREE};

    #[test]
    fn test_default_exists_after_init() {
        let mpcs = MpcManager::in_memory();
        assert!(mpcs.contains_with_id(DEFAULT_MPC_ID).unwrap());
        assert_eq!(mpcs.len(), 1);

        let sled_backed =
            MpcManager::new(Box::new(SledStore::temporary(MPC_TREE).unwrap())).unwrap();
        assert!(sled_backed.contains_with_id(DEFAULT_MPC_ID).unwrap());
    }

    #[test]
    fn test_default_cannot_be_deleted() {
        let mpcs = MpcManager::in_memory();
        assert!(matches!(
            mpcs.delete(DEFAULT_MPC_ID),
            Err(RegistryError::DefaultMpcProtected)
        ));
        assert!(mpcs.contains_with_id(DEFAULT_MPC_ID).unwrap());
    }

    #[test]
    fn test_create_get_delete() {
        let mpcs = MpcManager::in_memory();
        mpcs.create(Mpc::new("urn:mpc:invoices").with_description("invoices")).unwrap();

        let mpc = mpcs.get("urn:mpc:invoices").unwrap().unwrap();
        assert_eq!(mpc.description.as_deref(), Some("invoices"));

        assert!(matches!(
            mpcs.create(Mpc::new("urn:mpc:invoices")),
            Err(RegistryError::AlreadyExists(_))
        ));

        assert!(mpcs.delete("urn:mpc:invoices").unwrap());
        assert!(!mpcs.delete("urn:mpc:invoices").unwrap());
        assert!(mpcs.get("urn:mpc:invoices").unwrap().is_none());
    }

    #[test]
    fn test_sub_channel_needs_parent() {
        let mpcs = MpcManager::in_memory();
        assert!(matches!(
            mpcs.create(Mpc::sub_channel("urn:mpc:missing", "urn:mpc:missing/a")),
            Err(RegistryError::UnknownParentMpc(_))
        ));

        mpcs.create(Mpc::sub_channel(DEFAULT_MPC_ID, "urn:mpc:default/a")).unwrap();
        mpcs.create(Mpc::new("urn:mpc:p")).unwrap();
        mpcs.create(Mpc::sub_channel("urn:mpc:p", "urn:mpc:p/1")).unwrap();

        assert!(matches!(
            mpcs.delete("urn:mpc:p"),
            Err(RegistryError::MpcHasSubChannels(_))
        ));
        assert!(mpcs.delete("urn:mpc:p/1").unwrap());
        assert!(mpcs.delete("urn:mpc:p").unwrap());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mpcs = MpcManager::in_memory();
        let err = mpcs.create(Mpc::new("")).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(mpcs.len(), 1);
    }

    #[test]
    fn test_all_is_ordered() {
        let mpcs = MpcManager::in_memory();
        mpcs.create(Mpc::new("urn:b")).unwrap();
        mpcs.create(Mpc::new("urn:a")).unwrap();
        let ids: Vec<_> = mpcs.all().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![DEFAULT_MPC_ID.to_string(), "urn:a".to_string(), "urn:b".to_string()]
        );
    }
}
