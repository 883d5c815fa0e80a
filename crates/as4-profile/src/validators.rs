//! Generic validators usable by any profile.

use serde::{Deserialize, Serialize};
use tracing::debug;

use as4_model::{
    Binding, ClassifierError, ErrorList, Mep, MepBindingTable, MessageKind, PMode, PModeLeg,
    PModeValidator, SignalMessageInfo, SignalMessageValidator, UserMessageInfo,
    UserMessageValidator,
};
use as4_model::party::Party;

/// Which agreements a profile admits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PModeRules {
    pub allowed_meps: Vec<Mep>,
    pub allowed_bindings: Vec<Binding>,
    /// Reject PModes with an empty agreement reference.
    pub require_agreement: bool,
}

impl PModeRules {
    /// Admits every MEP and binding.
    pub fn permissive() -> Self {
        Self {
            allowed_meps: Mep::ALL.to_vec(),
            allowed_bindings: Binding::ALL.to_vec(),
            require_agreement: true,
        }
    }

    #[must_use]
    pub fn with_meps(mut self, meps: &[Mep]) -> Self {
        self.allowed_meps = meps.to_vec();
        self
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: &[Binding]) -> Self {
        self.allowed_bindings = bindings.to_vec();
        self
    }
}

impl Default for PModeRules {
    fn default() -> Self {
        Self::permissive()
    }
}

/// PMode validator driven by a decision table and a rule set.
#[derive(Debug, Clone, Default)]
pub struct GenericPModeValidator {
    table: MepBindingTable,
    rules: PModeRules,
}

impl GenericPModeValidator {
    pub fn new(table: MepBindingTable, rules: PModeRules) -> Self {
        Self { table, rules }
    }

    pub fn rules(&self) -> &PModeRules {
        &self.rules
    }

    fn check_party(field: &str, party: Option<&Party>, errors: &mut ErrorList) {
        match party {
            None => errors.error(field, "party is missing"),
            Some(p) => {
                if p.id.trim().is_empty() {
                    errors.error(format!("{field}.id"), "party id is empty");
                }
                if p.role.trim().is_empty() {
                    errors.error(format!("{field}.role"), "party role is empty");
                }
                if matches!(&p.id_type, Some(t) if t.trim().is_empty()) {
                    errors.error(format!("{field}.id_type"), "party id type is present but empty");
                }
            }
        }
    }

    fn check_leg(field: &str, leg: &PModeLeg, errors: &mut ErrorList) {
        if let Some(protocol) = &leg.protocol {
            if matches!(&protocol.address, Some(a) if a.trim().is_empty()) {
                errors.error(format!("{field}.protocol.address"), "address is present but empty");
            }
        }
        if let Some(ra) = &leg.reception_awareness {
            if ra.retry && ra.max_retries == 0 {
                errors.warn(
                    format!("{field}.reception_awareness"),
                    "retry is enabled with zero retries",
                );
            }
        }
    }
}

impl PModeValidator for GenericPModeValidator {
    fn validate_pmode(&self, pmode: &PMode, errors: &mut ErrorList) -> Result<(), ClassifierError> {
        // Structural errors abort before any business rule is looked at.
        let admits_any = self.table.admits_any(pmode.mep, pmode.binding)?;

        if pmode.resolved_id().map_or(true, |id| id.trim().is_empty()) {
            errors.error("id", "no id set and none can be derived");
        }

        Self::check_party("initiator", pmode.initiator.as_ref(), errors);
        Self::check_party("responder", pmode.responder.as_ref(), errors);

        if self.rules.require_agreement && pmode.agreement.trim().is_empty() {
            errors.error("agreement", "agreement reference is empty");
        }
        if pmode.mpc_id.trim().is_empty() {
            errors.error("mpc_id", "MPC id is empty");
        }

        if !self.rules.allowed_meps.contains(&pmode.mep) {
            errors.error("mep", format!("MEP {} is not supported by this profile", pmode.mep));
        }
        if !self.rules.allowed_bindings.contains(&pmode.binding) {
            errors.error(
                "binding",
                format!("binding {} is not supported by this profile", pmode.binding),
            );
        }
        if !admits_any {
            errors.error(
                "binding",
                format!("{}/{} admits no message kind", pmode.mep, pmode.binding),
            );
        }

        match &pmode.leg1 {
            Some(leg) => Self::check_leg("leg1", leg, errors),
            None => errors.error("leg1", "leg 1 is missing"),
        }
        match (pmode.mep, &pmode.leg2) {
            (Mep::OneWay, Some(_)) => errors.error("leg2", "one-way PModes have exactly one leg"),
            (Mep::TwoWay, None) => errors.error("leg2", "two-way PModes need a second leg"),
            (_, Some(leg)) => Self::check_leg("leg2", leg, errors),
            (Mep::OneWay, None) => {}
        }

        debug!(pmode = %pmode.id, findings = errors.len(), "validated PMode");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericUserMessageValidator;

impl UserMessageValidator for GenericUserMessageValidator {
    fn validate_user_message(&self, message: &UserMessageInfo, errors: &mut ErrorList) {
        if message.message_id.trim().is_empty() {
            errors.error("message_id", "message id is empty");
        }
        if message.from_party_id.trim().is_empty() {
            errors.error("from_party_id", "sending party id is empty");
        }
        if message.to_party_id.trim().is_empty() {
            errors.error("to_party_id", "receiving party id is empty");
        }
        if message.service.trim().is_empty() {
            errors.error("service", "service is empty");
        }
        if message.action.trim().is_empty() {
            errors.error("action", "action is empty");
        }
        if message.ref_to_message_id.as_deref() == Some(message.message_id.as_str()) {
            errors.error("ref_to_message_id", "message references itself");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSignalMessageValidator;

impl SignalMessageValidator for GenericSignalMessageValidator {
    fn validate_signal_message(&self, message: &SignalMessageInfo, errors: &mut ErrorList) {
        if message.message_id.trim().is_empty() {
            errors.error("message_id", "message id is empty");
        }
        match message.kind {
            MessageKind::Receipt | MessageKind::Error => {
                if message.ref_to_message_id.as_deref().map_or(true, str::is_empty) {
                    errors.error(
                        "ref_to_message_id",
                        format!("{} must reference the message it answers", message.kind),
                    );
                }
            }
            MessageKind::PullRequest => {
                if message.mpc_id.as_deref().map_or(true, str::is_empty) {
                    errors.error("mpc_id", "pull request names no MPC");
                }
            }
            MessageKind::UserMessage => {
                errors.error("kind", "a user message is not a signal");
            }
        }
    }
}
