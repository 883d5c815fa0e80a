//! # AS4 Registries
//!
//! The stateful half of the engine: agreements, partitions and the
//! duplicate-detection cache, each written against the [`KeyedStore`]
//! persistence boundary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        AS4 REGISTRIES                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌───────────────┐    validates via    ┌──────────────────┐  │
//! │  │ PModeRegistry │ ──────────────────▶ │ PModeValidator   │  │
//! │  │               │                     │ (active profile) │  │
//! │  └───────┬───────┘                     └──────────────────┘  │
//! │          │ checks MPC                                        │
//! │          ▼                                                   │
//! │  ┌───────────────┐                     ┌──────────────────┐  │
//! │  │  MpcManager   │                     │  DuplicateCache  │  │
//! │  └───────┬───────┘                     └────────┬─────────┘  │
//! │          │                                      │            │
//! │          ▼                                      ▼            │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │        KeyedStore: MemoryStore (dashmap) | SledStore   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use as4_registry::{DuplicateCache, DuplicateCheck};
//!
//! let cache = DuplicateCache::in_memory();
//! assert_eq!(cache.register_and_check("msg-1", "generic", "pm-1")?, DuplicateCheck::Continue);
//! assert_eq!(cache.register_and_check("msg-1", "generic", "pm-1")?, DuplicateCheck::Stop);
//! # Ok::<(), as4_registry::RegistryError>(())
//! ```

pub mod clock;
pub mod duplicate;
pub mod error;
pub mod mpc;
pub mod pmode;
pub mod sled_store;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duplicate::{DuplicateCache, DuplicateCheck, DuplicateItem};
pub use error::{RegistryError, Result, StoreError};
pub use mpc::{Mpc, MpcManager};
pub use pmode::{PModeRegistry, PModeUpdate};
pub use sled_store::SledStore;
pub use store::{KeyedStore, MemoryStore};
