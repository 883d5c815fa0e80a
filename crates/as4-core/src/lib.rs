//! # AS4 Core
//!
//! Engine context for a PMode-governed ebMS3/AS4 message exchange.
//! Wires the profile, MPC, PMode and duplicate registries and decides
//! whether an inbound message is processed, rejected or acknowledged as a
//! duplicate.
//!
//! ## Inbound Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     As4Context::process_inbound                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  contract ─▶ PMode ─▶ MPC ─▶ MEP/binding ─▶ header ─▶ duplicate │
//! │   check      lookup   check   classifier    validator   cache   │
//! │     │          │        │         │            │          │     │
//! │     ▼          ▼        ▼         ▼            ▼          ▼     │
//! │  Contract  EBMS:0010 EBMS:0001 EBMS:0010   EBMS:0009  Continue  │
//! │                                                      | Duplicate│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use as4_core::{As4Config, As4Context, InboundDecision, InboundMessage};
//! use as4_model::{MessageInfo, MessageKind, SignalMessageInfo};
//! use as4_profile::ProfileRegistry;
//!
//! let ctx = As4Context::new(As4Config::default(), Arc::new(ProfileRegistry::with_builtin()))?;
//! let pmode = ctx.get_or_create_default_pmode("partner")?;
//!
//! let inbound = InboundMessage {
//!     pmode_id: pmode.id.clone(),
//!     is_leg1: true,
//!     message: MessageInfo::Signal(SignalMessageInfo {
//!         kind: MessageKind::Receipt,
//!         message_id: "receipt-1".to_string(),
//!         ref_to_message_id: Some("msg-1".to_string()),
//!         mpc_id: None,
//!     }),
//! };
//! assert!(matches!(ctx.process_inbound(&inbound)?, InboundDecision::Continue { .. }));
//! assert!(ctx.process_inbound(&inbound)?.is_duplicate());
//! # Ok::<(), as4_core::As4Error>(())
//! ```
//!
//! ## Notes
//!
//! - Faults reference the offending message id
//! - Rejected messages never enter the duplicate cache
//! - An undefined MEP/binding pair is fatal and surfaces as
//!   [`As4Error::Classifier`], never as a fault

pub mod cleanup;
pub mod config;
pub mod context;
pub mod dump;
mod error;

pub use cleanup::{spawn_configured_cleanup, spawn_duplicate_cleanup};
pub use config::{
    As4Config, DumpConfig, DuplicateConfig, EndpointConfig, ProfileConfig, StorageBackend,
    StorageConfig,
};
pub use context::{As4Context, InboundDecision, InboundMessage};
pub use dump::{DumpHook, FileIncomingDumper, IncomingDumper, MirrorReader, RequestMetadata};
pub use error::As4Error;

/// Core result type for engine operations.
pub type Result<T> = std::result::Result<T, As4Error>;
