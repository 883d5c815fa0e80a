//! Error types for the AS4 engine.

use as4_model::{ClassifierError, EbmsFault};
use as4_profile::ProfileError;
use as4_registry::RegistryError;
use thiserror::Error;

/// Core error type for engine operations.
///
/// A [`Fault`](As4Error::Fault) is about the incoming message and goes back
/// to the sender as an ebMS error signal. A [`Contract`](As4Error::Contract)
/// is about how the engine was called. The two never overlap.
#[derive(Debug, Error)]
pub enum As4Error {
    /// Protocol compliance failure of an inbound message.
    #[error("protocol fault: {0}")]
    Fault(#[from] EbmsFault),

    /// The caller broke the API contract (e.g. an empty identifier).
    #[error("contract violation: {0}")]
    Contract(String),

    /// Undefined MEP/binding pair. Fatal, not retried.
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Registry or store failure.
    #[error("registry error: {0}")]
    Registry(RegistryError),

    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl As4Error {
    pub fn is_fault(&self) -> bool {
        matches!(self, As4Error::Fault(_))
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, As4Error::Contract(_))
    }

    pub fn fault(&self) -> Option<&EbmsFault> {
        match self {
            As4Error::Fault(f) => Some(f),
            _ => None,
        }
    }
}

impl From<RegistryError> for As4Error {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::EmptyId(what) => As4Error::Contract(format!("{what} must not be empty")),
            RegistryError::Classifier(c) => As4Error::Classifier(c),
            other => As4Error::Registry(other),
        }
    }
}

impl From<sled::Error> for As4Error {
    fn from(e: sled::Error) -> Self {
        As4Error::Registry(RegistryError::Store(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use as4_model::{Binding, EbmsErrorCode, Mep};

    #[test]
    fn test_registry_empty_id_becomes_contract() {
        let err: As4Error = RegistryError::EmptyId("message id").into();
        assert!(err.is_contract_violation());
        assert!(!err.is_fault());
    }

    #[test]
    fn test_registry_classifier_is_lifted() {
        let err: As4Error = RegistryError::Classifier(ClassifierError::UndefinedCombination {
            mep: Mep::OneWay,
            binding: Binding::Push,
            table_version: 1,
        })
        .into();
        assert!(matches!(err, As4Error::Classifier(_)));
    }

    #[test]
    fn test_fault_accessor() {
        let err: As4Error = EbmsFault::new(EbmsErrorCode::Other, "boom").into();
        assert!(err.is_fault());
        assert_eq!(err.fault().unwrap().code, EbmsErrorCode::Other);
    }
}
