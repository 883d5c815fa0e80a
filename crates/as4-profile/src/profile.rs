//! A profile is data: an id, a name, a default flag and three validators.

use std::fmt;
use std::sync::Arc;

use as4_model::{MepBindingTable, PModeValidator, SignalMessageValidator, UserMessageValidator};

use crate::validators::{
    GenericPModeValidator, GenericSignalMessageValidator, GenericUserMessageValidator, PModeRules,
};

/// Id of the built-in generic profile.
pub const GENERIC_PROFILE_ID: &str = "generic";

/// A named bundle of validator capabilities.
///
/// Validators are independent `Arc`s, so a deployment can swap one of them
/// without touching the other two.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use as4_model::{Binding, Mep, MepBindingTable};
/// use as4_profile::{GenericPModeValidator, PModeRules, Profile};
///
/// let rules = PModeRules::permissive()
///     .with_meps(&[Mep::OneWay])
///     .with_bindings(&[Binding::Push]);
/// let profile = Profile::generic()
///     .with_id("one-way-only")
///     .with_display_name("One-way push only")
///     .with_pmode_validator(Arc::new(GenericPModeValidator::new(MepBindingTable::v1(), rules)));
///
/// assert_eq!(profile.id(), "one-way-only");
/// ```
#[derive(Clone)]
pub struct Profile {
    id: String,
    display_name: String,
    is_default: bool,
    pmode_validator: Arc<dyn PModeValidator>,
    user_message_validator: Arc<dyn UserMessageValidator>,
    signal_message_validator: Arc<dyn SignalMessageValidator>,
}

impl Profile {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        pmode_validator: Arc<dyn PModeValidator>,
        user_message_validator: Arc<dyn UserMessageValidator>,
        signal_message_validator: Arc<dyn SignalMessageValidator>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_default: false,
            pmode_validator,
            user_message_validator,
            signal_message_validator,
        }
    }

    /// The generic profile: revision-1 table, every MEP and binding.
    pub fn generic() -> Self {
        Self::generic_with_table(MepBindingTable::v1())
    }

    pub fn generic_with_table(table: MepBindingTable) -> Self {
        Self::new(
            GENERIC_PROFILE_ID,
            "Generic AS4",
            Arc::new(GenericPModeValidator::new(table, PModeRules::permissive())),
            Arc::new(GenericUserMessageValidator),
            Arc::new(GenericSignalMessageValidator),
        )
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn as_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    #[must_use]
    pub fn with_pmode_validator(mut self, v: Arc<dyn PModeValidator>) -> Self {
        self.pmode_validator = v;
        self
    }

    #[must_use]
    pub fn with_user_message_validator(mut self, v: Arc<dyn UserMessageValidator>) -> Self {
        self.user_message_validator = v;
        self
    }

    #[must_use]
    pub fn with_signal_message_validator(mut self, v: Arc<dyn SignalMessageValidator>) -> Self {
        self.signal_message_validator = v;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn pmode_validator(&self) -> Arc<dyn PModeValidator> {
        Arc::clone(&self.pmode_validator)
    }

    pub fn user_message_validator(&self) -> &dyn UserMessageValidator {
        self.user_message_validator.as_ref()
    }

    pub fn signal_message_validator(&self) -> &dyn SignalMessageValidator {
        self.signal_message_validator.as_ref()
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("is_default", &self.is_default)
            .finish()
    }
}
