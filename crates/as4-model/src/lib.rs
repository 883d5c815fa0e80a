//! # AS4 Model
//!
//! Value types shared by every part of the AS4/ebMS3 engine.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`mep`] | MEP, binding and message kind identifiers |
//! | [`classifier`] | Versioned MEP/binding decision table |
//! | [`party`] | Trading partner identity |
//! | [`pmode`] | Agreements (PModes) and their legs |
//! | [`message`] | Inbound user/signal message headers |
//! | [`validation`] | Finding accumulator used by all validators |
//! | [`validator`] | Validator capability traits |
//! | [`fault`] | ebMS3 protocol faults |
//!
//! ## Example
//!
//! ```rust
//! use as4_model::{is_valid_message_type, Binding, Mep, MessageKind};
//!
//! let legal = is_valid_message_type(Mep::OneWay, Binding::Push, MessageKind::Receipt, true)?;
//! assert!(legal);
//! # Ok::<(), as4_model::ClassifierError>(())
//! ```

pub mod classifier;
pub mod error;
pub mod fault;
pub mod mep;
pub mod message;
pub mod party;
pub mod pmode;
pub mod validation;
pub mod validator;

pub use classifier::{is_valid_message_type, MepBindingTable, TableRevision};
pub use error::{ClassifierError, ModelError};
pub use fault::{EbmsErrorCode, EbmsFault};
pub use mep::{Binding, Mep, MessageKind};
pub use message::{MessageInfo, SignalMessageInfo, UserMessageInfo};
pub use party::Party;
pub use pmode::{PMode, PModeLeg, DEFAULT_MPC_ID};
pub use validation::{ErrorLevel, ErrorList, ValidationError};
pub use validator::{PModeValidator, SignalMessageValidator, UserMessageValidator};
