//! # AS4 Profiles
//!
//! A profile bundles the three validator capabilities a deployment applies:
//! one for PModes, one for user messages and one for signal messages.
//! Profiles are composed rather than subclassed, so a document-exchange
//! community can pick its own PMode rules and keep the generic message
//! validators.

mod error;
mod profile;
mod registry;
mod validators;

pub use error::{ProfileError, Result};
pub use profile::{Profile, GENERIC_PROFILE_ID};
pub use registry::ProfileRegistry;
pub use validators::{
    GenericPModeValidator, GenericSignalMessageValidator, GenericUserMessageValidator, PModeRules,
};
