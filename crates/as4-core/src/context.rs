//! The engine context.
//!
//! [`As4Context`] wires the profile, MPC, PMode and duplicate registries
//! together in a fixed startup order and runs the inbound decision
//! pipeline. It is built once per process and passed by handle; tests
//! build one per case.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use as4_model::{EbmsErrorCode, EbmsFault, ErrorList, MepBindingTable, MessageInfo, PMode};
use as4_profile::{Profile, ProfileRegistry};
use as4_registry::sled_store::{DUPLICATE_TREE, MPC_TREE, PMODE_TREE};
use as4_registry::{
    Clock, DuplicateCache, DuplicateCheck, DuplicateItem, KeyedStore, MemoryStore, Mpc, MpcManager,
    PModeRegistry, RegistryError, SledStore, SystemClock,
};

use crate::config::{As4Config, StorageBackend};
use crate::dump::{DumpHook, FileIncomingDumper};
use crate::error::As4Error;
use crate::Result;

/// What the transport layer hands over for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Candidate PMode the message was attributed to.
    pub pmode_id: String,
    pub is_leg1: bool,
    pub message: MessageInfo,
}

/// Outcome of [`As4Context::process_inbound`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundDecision {
    /// New message: process it.
    Continue { pmode_id: String },
    /// Already seen: acknowledge without processing.
    Duplicate { pmode_id: String },
}

impl InboundDecision {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, InboundDecision::Duplicate { .. })
    }

    pub fn pmode_id(&self) -> &str {
        match self {
            InboundDecision::Continue { pmode_id } | InboundDecision::Duplicate { pmode_id } => {
                pmode_id
            }
        }
    }
}

/// The three backing stores of the registries.
struct RegistryStores {
    mpcs: Box<dyn KeyedStore<Mpc>>,
    pmodes: Box<dyn KeyedStore<PMode>>,
    duplicates: Box<dyn KeyedStore<DuplicateItem>>,
}

impl RegistryStores {
    fn in_memory() -> Self {
        Self {
            mpcs: Box::new(MemoryStore::new()),
            pmodes: Box::new(MemoryStore::new()),
            duplicates: Box::new(MemoryStore::new()),
        }
    }

    /// Opens the configured backend. A sled database is shared by all
    /// three registries, one tree each.
    fn open(backend: &StorageBackend) -> Result<Self> {
        match backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::Sled { path } => {
                let db = sled::open(path)?;
                info!(path = %path.display(), "opened sled storage");
                Ok(Self {
                    mpcs: Box::new(SledStore::from_db(&db, MPC_TREE).map_err(RegistryError::from)?),
                    pmodes: Box::new(
                        SledStore::from_db(&db, PMODE_TREE).map_err(RegistryError::from)?,
                    ),
                    duplicates: Box::new(
                        SledStore::from_db(&db, DUPLICATE_TREE).map_err(RegistryError::from)?,
                    ),
                })
            }
        }
    }
}

/// Process-wide engine state.
///
/// # Thread Safety
///
/// All methods take `&self`; share the context as `Arc<As4Context>`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use as4_core::{As4Config, As4Context};
/// use as4_profile::ProfileRegistry;
///
/// let ctx = As4Context::new(As4Config::default(), Arc::new(ProfileRegistry::with_builtin()))?;
/// assert!(ctx.mpcs().contains_with_id(as4_model::DEFAULT_MPC_ID)?);
/// # Ok::<(), as4_core::As4Error>(())
/// ```
pub struct As4Context {
    config: As4Config,
    profiles: Arc<ProfileRegistry>,
    profile: Arc<Profile>,
    table: MepBindingTable,
    mpcs: Arc<MpcManager>,
    pmodes: PModeRegistry,
    duplicates: DuplicateCache,
    dump_hook: DumpHook,
    clock: Arc<dyn Clock>,
}

impl As4Context {
    /// Builds the context with the system clock.
    ///
    /// # Errors
    ///
    /// - `As4Error::Config` for an invalid configuration or when no profile
    ///   can be selected
    /// - `As4Error::Registry` if the configured store cannot be opened
    pub fn new(config: As4Config, profiles: Arc<ProfileRegistry>) -> Result<Self> {
        Self::with_clock(config, profiles, Arc::new(SystemClock))
    }

    /// Builds the context with an explicit clock.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated here; immutable afterwards
    /// * `profiles` - Registry the active profile is selected from
    /// * `clock` - Time source of the duplicate cache and its eviction
    ///
    /// # Errors
    ///
    /// Same as [`As4Context::new`].
    pub fn with_clock(
        config: As4Config,
        profiles: Arc<ProfileRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let profile = Self::select_profile(&config, &profiles)?;
        let stores = RegistryStores::open(&config.storage.backend)?;
        Self::assemble(config, profiles, profile, clock, stores)
    }

    /// Wires the registries over already opened stores, in startup order:
    /// MPCs first, then PModes (which consult them), then duplicates.
    fn assemble(
        config: As4Config,
        profiles: Arc<ProfileRegistry>,
        profile: Arc<Profile>,
        clock: Arc<dyn Clock>,
        stores: RegistryStores,
    ) -> Result<Self> {
        let mpcs = Arc::new(MpcManager::new(stores.mpcs)?);
        let pmodes =
            PModeRegistry::new(stores.pmodes, profile.pmode_validator(), Arc::clone(&mpcs));
        let duplicates = DuplicateCache::new(stores.duplicates, Arc::clone(&clock));

        let dump_hook = DumpHook::new();
        if let Some(dir) = &config.dump.directory {
            dump_hook.set(Some(Arc::new(FileIncomingDumper::new(dir))));
        }

        info!(
            own_id = %config.endpoint.own_id,
            profile = profile.id(),
            pmodes = pmodes.len(),
            mpcs = mpcs.len(),
            "AS4 context initialized"
        );

        Ok(Self {
            table: config.mep_table.table(),
            config,
            profiles,
            profile,
            mpcs,
            pmodes,
            duplicates,
            dump_hook,
            clock,
        })
    }

    fn select_profile(config: &As4Config, profiles: &ProfileRegistry) -> Result<Arc<Profile>> {
        match &config.profile.active {
            Some(id) => profiles
                .get_by_id(id)
                .ok_or_else(|| As4Error::Config(format!("profile '{id}' is not registered"))),
            None => profiles.get_default().ok_or_else(|| {
                As4Error::Config(
                    "no profile configured and no default profile registered".to_string(),
                )
            }),
        }
    }

    pub fn config(&self) -> &As4Config {
        &self.config
    }

    pub fn own_id(&self) -> &str {
        &self.config.endpoint.own_id
    }

    pub fn default_responder_id(&self) -> &str {
        self.config.endpoint.effective_responder_id()
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// The profile selected at startup.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn table(&self) -> &MepBindingTable {
        &self.table
    }

    pub fn mpcs(&self) -> &MpcManager {
        &self.mpcs
    }

    pub fn pmodes(&self) -> &PModeRegistry {
        &self.pmodes
    }

    pub fn duplicates(&self) -> &DuplicateCache {
        &self.duplicates
    }

    pub fn dump_hook(&self) -> &DumpHook {
        &self.dump_hook
    }

    /// Decides whether an inbound message is accepted.
    ///
    /// Pipeline: contract check, PMode resolution, MPC check, MEP/binding
    /// classification, profile header validation, duplicate detection.
    ///
    /// # Arguments
    ///
    /// * `inbound` - Header summary and PMode attribution from the transport
    ///
    /// # Returns
    ///
    /// `Continue` for a new message, `Duplicate` for a redelivery. Only
    /// messages that pass every check are registered as seen.
    ///
    /// # Errors
    ///
    /// - `As4Error::Fault` when the message must be rejected; the transport
    ///   layer reports it to the sender
    /// - `As4Error::Contract` for empty message or PMode ids
    /// - `As4Error::Classifier` if the PMode's MEP/binding is undefined
    /// - `As4Error::Registry` if a store fails; never turned into a fault
    pub fn process_inbound(&self, inbound: &InboundMessage) -> Result<InboundDecision> {
        let message_id = inbound.message.message_id();
        if message_id.is_empty() {
            return Err(As4Error::Contract("message id must not be empty".to_string()));
        }
        if inbound.pmode_id.is_empty() {
            return Err(As4Error::Contract("PMode id must not be empty".to_string()));
        }

        let pmode = self.pmodes.get(&inbound.pmode_id)?.ok_or_else(|| {
            EbmsFault::new(
                EbmsErrorCode::ProcessingModeMismatch,
                format!("no PMode with id '{}'", inbound.pmode_id),
            )
            .referencing(message_id)
        })?;

        let mpc_id = inbound.message.mpc_id().unwrap_or(pmode.mpc_id.as_str());
        if !self.mpcs.contains_with_id(mpc_id)? {
            return Err(EbmsFault::new(
                EbmsErrorCode::ValueNotRecognized,
                format!("MPC '{mpc_id}' is not registered"),
            )
            .referencing(message_id)
            .into());
        }

        let kind = inbound.message.kind();
        if !self
            .table
            .is_valid_message_type(pmode.mep, pmode.binding, kind, inbound.is_leg1)?
        {
            let leg = if inbound.is_leg1 { 1 } else { 2 };
            warn!(message_id, pmode = %pmode.id, %kind, leg, "message kind not legal for PMode");
            return Err(EbmsFault::new(
                EbmsErrorCode::ProcessingModeMismatch,
                format!("{kind} is not legal on leg {leg} of {}/{}", pmode.mep, pmode.binding),
            )
            .referencing(message_id)
            .into());
        }

        let mut errors = ErrorList::new();
        match &inbound.message {
            MessageInfo::User(user) => self
                .profile
                .user_message_validator()
                .validate_user_message(user, &mut errors),
            MessageInfo::Signal(signal) => self
                .profile
                .signal_message_validator()
                .validate_signal_message(signal, &mut errors),
        }
        if errors.contains_errors() {
            warn!(message_id, findings = %errors.summary(), "message header rejected");
            let fault =
                EbmsFault::new(EbmsErrorCode::InvalidHeader, "message header failed validation")
                    .with_detail(errors.summary())
                    .referencing(message_id);
            return Err(fault.into());
        }

        let check = self
            .duplicates
            .register_and_check(message_id, self.profile.id(), &pmode.id)?;
        let pmode_id = pmode.id;
        match check {
            DuplicateCheck::Continue => {
                debug!(message_id, pmode = %pmode_id, "accepted inbound message");
                Ok(InboundDecision::Continue { pmode_id })
            }
            DuplicateCheck::Stop => Ok(InboundDecision::Duplicate { pmode_id }),
        }
    }

    /// Returns the default PMode for `initiator_id`, storing it first if
    /// needed. The responder is the configured default responder.
    ///
    /// # Errors
    ///
    /// - `As4Error::Contract` for an empty initiator id
    /// - `As4Error::Config` if the active profile rejects the default PMode
    pub fn get_or_create_default_pmode(&self, initiator_id: &str) -> Result<PMode> {
        if initiator_id.is_empty() {
            return Err(As4Error::Contract("initiator id must not be empty".to_string()));
        }

        let pmode = PMode::default_for(
            initiator_id,
            self.default_responder_id(),
            self.config.endpoint.default_address.as_deref(),
        );
        if let Some(existing) = self.pmodes.get(&pmode.id)? {
            return Ok(existing);
        }

        let update = self.pmodes.create_or_update(pmode.clone())?;
        if !update.stored {
            return Err(As4Error::Config(format!(
                "profile '{}' rejects the default PMode: {}",
                self.profile.id(),
                update.errors.summary()
            )));
        }
        Ok(pmode)
    }

    /// Removes an MPC that no stored PMode references.
    ///
    /// # Errors
    ///
    /// - `As4Error::Registry` with `MpcInUse`, `DefaultMpcProtected` or
    ///   `MpcHasSubChannels` when the MPC must stay
    /// - `As4Error::Contract` for an empty id
    pub fn delete_mpc(&self, mpc_id: &str) -> Result<bool> {
        Ok(self.pmodes.delete_mpc(mpc_id)?)
    }

    /// Evicts duplicate items older than the configured retention.
    pub fn evict_expired_duplicates(&self) -> Result<Vec<String>> {
        let reference = i64::try_from(self.config.duplicates.retention_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .and_then(|retention| self.clock.now().checked_sub_signed(retention));
        // A retention beyond the representable range never expires anything.
        let Some(reference) = reference else {
            return Ok(Vec::new());
        };
        Ok(self.duplicates.evict_all_items_before(reference)?)
    }
}

impl std::fmt::Debug for As4Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("As4Context")
            .field("own_id", &self.own_id())
            .field("profile", &self.profile.id())
            .field("pmodes", &self.pmodes.len())
            .field("mpcs", &self.mpcs.len())
            .field("duplicates", &self.duplicates.size())
            .finish()
    }
}
