//! Error types for the registries and their stores.

use as4_model::ClassifierError;
use thiserror::Error;

/// Failures of the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored key is not valid UTF-8.
    #[error("stored key is not valid UTF-8")]
    InvalidKey,
}

/// Errors raised by the PMode, MPC and duplicate registries.
///
/// Validation findings are not errors; they come back in an
/// [`ErrorList`](as4_model::ErrorList).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Structural classifier failure inside PMode validation.
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// Caller passed an empty identifier. Nothing was changed.
    #[error("{0} must not be empty")]
    EmptyId(&'static str),

    #[error("already registered: {0}")]
    AlreadyExists(String),

    #[error("the default MPC cannot be deleted")]
    DefaultMpcProtected,

    #[error("parent MPC not registered: {0}")]
    UnknownParentMpc(String),

    #[error("MPC {0} still has sub-channels")]
    MpcHasSubChannels(String),

    /// A stored PMode still names the MPC.
    #[error("MPC {mpc} is referenced by PMode {pmode}")]
    MpcInUse { mpc: String, pmode: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    /// True for misuse by the caller, as opposed to storage or
    /// configuration failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RegistryError::EmptyId(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_is_contract_violation() {
        let err = RegistryError::EmptyId("message id");
        assert!(err.is_contract_violation());
        assert_eq!(err.to_string(), "message id must not be empty");
        assert!(!RegistryError::DefaultMpcProtected.is_contract_violation());
    }
}
