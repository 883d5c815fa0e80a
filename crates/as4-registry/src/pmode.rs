//! # PMode Registry
//!
//! Keyed store of agreements. Every write is validated by the active
//! profile's PMode validator and only stored when no error-level finding
//! remains; a rejected write leaves the previous entry untouched.
//!
//! ## Write Flow
//!
//! 1. Take the write gate (writers are serialized, readers are not)
//! 2. Run the profile validator; a structural classifier error aborts here
//! 3. Check that the referenced MPC is registered
//! 4. Resolve the id (explicit, or derived from parties and agreement)
//! 5. Store or replace the entry

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use as4_model::{ErrorList, PMode, PModeValidator};

use crate::error::{RegistryError, Result};
use crate::mpc::MpcManager;
use crate::store::{KeyedStore, MemoryStore};

/// Outcome of [`PModeRegistry::create_or_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PModeUpdate {
    /// Resolved id; `None` if neither set nor derivable.
    pub id: Option<String>,
    /// Every finding of the validation pass, warnings included.
    pub errors: ErrorList,
    /// Whether the PMode was written.
    pub stored: bool,
    /// Whether the write replaced an existing entry.
    pub replaced: bool,
}

impl PModeUpdate {
    pub fn is_success(&self) -> bool {
        self.stored
    }
}

pub struct PModeRegistry {
    store: Box<dyn KeyedStore<PMode>>,
    validator: Arc<dyn PModeValidator>,
    mpcs: Arc<MpcManager>,
    write_gate: Mutex<()>,
}

impl PModeRegistry {
    pub fn new(
        store: Box<dyn KeyedStore<PMode>>,
        validator: Arc<dyn PModeValidator>,
        mpcs: Arc<MpcManager>,
    ) -> Self {
        Self {
            store,
            validator,
            mpcs,
            write_gate: Mutex::new(()),
        }
    }

    pub fn in_memory(validator: Arc<dyn PModeValidator>, mpcs: Arc<MpcManager>) -> Self {
        Self::new(Box::new(MemoryStore::new()), validator, mpcs)
    }

    /// Validates and stores `pmode`.
    ///
    /// # Arguments
    ///
    /// * `pmode` - The agreement; an empty id is derived from its parties
    ///   and agreement reference
    ///
    /// # Returns
    ///
    /// A [`PModeUpdate`] with the resolved id and every finding. Validation
    /// findings are never returned as an error; a rejected update leaves
    /// the previous entry untouched.
    ///
    /// # Errors
    ///
    /// - `RegistryError::Classifier` if the MEP/binding pair is undefined;
    ///   nothing is stored
    /// - `RegistryError::Store` if the MPC lookup or the write fails
    pub fn create_or_update(&self, mut pmode: PMode) -> Result<PModeUpdate> {
        let _gate = self.write_gate.lock();

        let mut errors = ErrorList::new();
        self.validator.validate_pmode(&pmode, &mut errors)?;

        if !pmode.mpc_id.is_empty() && !self.mpcs.contains_with_id(&pmode.mpc_id)? {
            errors.error("mpc_id", format!("MPC '{}' is not registered", pmode.mpc_id));
        }

        let id = pmode.resolved_id().filter(|id| !id.trim().is_empty());
        let id = match id {
            Some(id) if !errors.contains_errors() => id,
            id => {
                warn!(
                    pmode = id.as_deref().unwrap_or("<none>"),
                    findings = %errors.summary(),
                    "rejected PMode"
                );
                return Ok(PModeUpdate {
                    id,
                    errors,
                    stored: false,
                    replaced: false,
                });
            }
        };

        pmode.id = id.clone();
        let replaced = self.store.put(&id, pmode)?.is_some();
        info!(pmode = %id, replaced, "stored PMode");

        Ok(PModeUpdate {
            id: Some(id),
            errors,
            stored: true,
            replaced,
        })
    }

    /// # Errors
    ///
    /// `RegistryError::EmptyId` for an empty id.
    pub fn get(&self, id: &str) -> Result<Option<PMode>> {
        if id.is_empty() {
            return Err(RegistryError::EmptyId("PMode id"));
        }
        Ok(self.store.get(id)?)
    }

    /// Removes a PMode. Returns false if it did not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(RegistryError::EmptyId("PMode id"));
        }
        let _gate = self.write_gate.lock();
        let removed = self.store.delete(id)?.is_some();
        if removed {
            info!(pmode = id, "deleted PMode");
        }
        Ok(removed)
    }

    /// Removes an MPC unless a stored PMode still references it.
    ///
    /// Runs under the PMode write gate, so no PMode naming the MPC can be
    /// stored between the reference check and the removal.
    ///
    /// # Arguments
    ///
    /// * `mpc_id` - The channel to remove
    ///
    /// # Returns
    ///
    /// `true` if the MPC existed and was removed.
    ///
    /// # Errors
    ///
    /// - `RegistryError::MpcInUse` naming the first referencing PMode
    /// - every error of [`MpcManager::delete`]
    pub fn delete_mpc(&self, mpc_id: &str) -> Result<bool> {
        let _gate = self.write_gate.lock();

        let mut referencing: Option<String> = None;
        self.store.for_each(&mut |id, pmode| {
            if referencing.is_none() && pmode.mpc_id == mpc_id {
                referencing = Some(id.to_string());
            }
        })?;
        if let Some(pmode) = referencing {
            warn!(mpc = mpc_id, pmode = %pmode, "refusing to delete referenced MPC");
            return Err(RegistryError::MpcInUse {
                mpc: mpc_id.to_string(),
                pmode,
            });
        }

        self.mpcs.delete(mpc_id)
    }

    /// # Errors
    ///
    /// Returns `RegistryError::Store` if the lookup fails.
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.store.contains(id)?)
    }

    /// Snapshot ordered by id.
    pub fn list_all(&self) -> Result<Vec<PMode>> {
        let mut pmodes = Vec::with_capacity(self.store.len());
        self.store.for_each(&mut |_, p| pmodes.push(p.clone()))?;
        pmodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pmodes)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for PModeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PModeRegistry")
            .field("pmode_count", &self.len())
            .finish()
    }
}
