//! Error types for the AS4 model crate.

use thiserror::Error;

use crate::mep::{Binding, Mep};

/// Errors raised while parsing model identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The string is neither an ebMS3 MEP URI nor a known short name.
    #[error("unknown message exchange pattern: {0}")]
    UnknownMep(String),

    /// The string is neither an ebMS3 binding URI nor a known short name.
    #[error("unknown MEP binding: {0}")]
    UnknownBinding(String),

    /// Unrecognized message kind.
    #[error("unknown message kind: {0}")]
    UnknownMessageKind(String),
}

/// Structural classifier failure.
///
/// Raised when a MEP/binding pair is not part of the active table revision.
/// This is a configuration defect, never a protocol-level rejection, and
/// aborts whatever validation pass encountered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("MEP/binding {mep}/{binding} is undefined in table revision {table_version}")]
    UndefinedCombination {
        mep: Mep,
        binding: Binding,
        table_version: u32,
    },
}
