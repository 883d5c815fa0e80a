//! Validator capabilities a profile bundles.
//!
//! Each validator appends findings to a caller-supplied [`ErrorList`]. Only
//! the PMode validator can fail outright, and only with a structural
//! classifier error.

use crate::error::ClassifierError;
use crate::message::{SignalMessageInfo, UserMessageInfo};
use crate::pmode::PMode;
use crate::validation::ErrorList;

pub trait PModeValidator: Send + Sync {
    /// Appends every violation found in `pmode` to `errors`.
    ///
    /// # Errors
    ///
    /// A [`ClassifierError`] aborts the pass immediately.
    fn validate_pmode(&self, pmode: &PMode, errors: &mut ErrorList) -> Result<(), ClassifierError>;
}

pub trait UserMessageValidator: Send + Sync {
    fn validate_user_message(&self, message: &UserMessageInfo, errors: &mut ErrorList);
}

pub trait SignalMessageValidator: Send + Sync {
    fn validate_signal_message(&self, message: &SignalMessageInfo, errors: &mut ErrorList);
}
