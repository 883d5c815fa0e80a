//! # Processing Mode (PMode)
//!
//! The stored configuration of a negotiated agreement between two parties.
//! Leg settings are carried for the transport and security layers and are
//! opaque to the decision logic, which only looks at how many legs exist.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::mep::{Binding, Mep};
use crate::party::Party;

/// Identifier of the partition every fresh MPC registry contains.
pub const DEFAULT_MPC_ID: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/defaultMPC";

/// Prefix of derived PMode ids.
pub const DERIVED_ID_PREFIX: &str = "pm-";

/// Default agreement reference of generated PModes.
pub const DEFAULT_AGREEMENT: &str = "urn:as4:agreements:so-that-we-have-a-non-empty-value";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoapVersion {
    Soap11,
    #[default]
    Soap12,
}

/// Where and how a leg is transported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegProtocol {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub soap_version: SoapVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpc_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandling {
    #[serde(default)]
    pub report_as_response: bool,
    #[serde(default)]
    pub report_process_error_notify_consumer: bool,
    #[serde(default)]
    pub report_delivery_failures_notify_producer: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyPattern {
    #[default]
    Response,
    Callback,
}

/// Security and receipt settings of a leg. Algorithm names are passed
/// through untouched to the WS-Security layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_sign_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_sign_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_encryption_algorithm: Option<String>,
    #[serde(default)]
    pub send_receipt: bool,
    #[serde(default)]
    pub send_receipt_non_repudiation: bool,
    #[serde(default)]
    pub receipt_reply_pattern: ReplyPattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionAwareness {
    pub retry: bool,
    pub max_retries: u32,
    pub retry_interval_ms: u64,
    pub duplicate_detection: bool,
}

impl Default for ReceptionAwareness {
    fn default() -> Self {
        Self {
            retry: true,
            max_retries: 3,
            retry_interval_ms: 10_000,
            duplicate_detection: true,
        }
    }
}

/// One directional hop of an exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PModeLeg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<LegProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_info: Option<BusinessInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handling: Option<ErrorHandling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<LegSecurity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reception_awareness: Option<ReceptionAwareness>,
}

impl PModeLeg {
    /// A leg that only knows where to send to.
    pub fn to_address(address: impl Into<String>) -> Self {
        Self {
            protocol: Some(LegProtocol {
                address: Some(address.into()),
                soap_version: SoapVersion::default(),
            }),
            ..Self::default()
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.protocol.as_ref().and_then(|p| p.address.as_deref())
    }
}

/// A negotiated messaging agreement.
///
/// Parties and legs are optional in the type so that incomplete submissions
/// can be represented and reported by validation instead of failing to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PMode {
    /// Empty means "derive from initiator, responder and agreement".
    #[serde(default)]
    pub id: String,
    pub mep: Mep,
    pub binding: Binding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder: Option<Party>,
    #[serde(default)]
    pub agreement: String,
    #[serde(default = "default_mpc_id")]
    pub mpc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg1: Option<PModeLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg2: Option<PModeLeg>,
}

fn default_mpc_id() -> String {
    DEFAULT_MPC_ID.to_string()
}

impl PMode {
    /// The one-way/push agreement used when no configured PMode matches an
    /// initiator.
    pub fn default_for(initiator_id: &str, responder_id: &str, address: Option<&str>) -> Self {
        let leg1 = match address {
            Some(a) => PModeLeg::to_address(a),
            None => PModeLeg::default(),
        };
        let mut pmode = Self {
            id: String::new(),
            mep: Mep::OneWay,
            binding: Binding::Push,
            initiator: Some(Party::with_default_role(initiator_id)),
            responder: Some(Party::with_default_role(responder_id)),
            agreement: DEFAULT_AGREEMENT.to_string(),
            mpc_id: default_mpc_id(),
            leg1: Some(leg1),
            leg2: None,
        };
        if let Some(id) = pmode.derive_id() {
            pmode.id = id;
        }
        pmode
    }

    /// Deterministic id from initiator, responder and agreement reference.
    ///
    /// Returns `None` if either party is missing. Re-submitting the same
    /// logical agreement therefore hits the same registry slot.
    pub fn derive_id(&self) -> Option<String> {
        let initiator = self.initiator.as_ref()?;
        let responder = self.responder.as_ref()?;

        let mut hasher = Sha256::new();
        for part in [
            initiator.id_type.as_deref().unwrap_or(""),
            initiator.id.as_str(),
            responder.id_type.as_deref().unwrap_or(""),
            responder.id.as_str(),
            self.agreement.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();

        let mut id = String::with_capacity(DERIVED_ID_PREFIX.len() + 32);
        id.push_str(DERIVED_ID_PREFIX);
        for byte in &digest[..16] {
            id.push_str(&format!("{byte:02x}"));
        }
        Some(id)
    }

    /// The explicit id, or the derived one when none was set.
    pub fn resolved_id(&self) -> Option<String> {
        if self.id.is_empty() {
            self.derive_id()
        } else {
            Some(self.id.clone())
        }
    }

    pub fn leg(&self, is_leg1: bool) -> Option<&PModeLeg> {
        if is_leg1 {
            self.leg1.as_ref()
        } else {
            self.leg2.as_ref()
        }
    }

    pub fn configured_leg_count(&self) -> usize {
        usize::from(self.leg1.is_some()) + usize::from(self.leg2.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PMode {
        PMode {
            id: String::new(),
            mep: Mep::TwoWay,
            binding: Binding::PushPull,
            initiator: Some(Party::with_default_role("sender")),
            responder: Some(Party::with_default_role("receiver")),
            agreement: "urn:agreement:1".to_string(),
            mpc_id: DEFAULT_MPC_ID.to_string(),
            leg1: Some(PModeLeg::to_address("https://receiver.example/as4")),
            leg2: Some(PModeLeg::default()),
        }
    }

    #[test]
    fn test_derived_id_is_deterministic() {
        let a = sample();
        let b = sample();
        assert_eq!(a.derive_id(), b.derive_id());
        assert!(a.derive_id().unwrap().starts_with(DERIVED_ID_PREFIX));
    }

    #[test]
    fn test_derived_id_depends_on_agreement() {
        let a = sample();
        let mut b = sample();
        b.agreement = "urn:agreement:2".to_string();
        assert_ne!(a.derive_id(), b.derive_id());
    }

    #[test]
    fn test_derived_id_needs_both_parties() {
        let mut p = sample();
        p.responder = None;
        assert!(p.derive_id().is_none());
        assert!(p.resolved_id().is_none());

        p.id = "explicit".to_string();
        assert_eq!(p.resolved_id().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_default_pmode_is_one_way_push() {
        let p = PMode::default_for("init", "resp", Some("https://x"));
        assert_eq!(p.mep, Mep::OneWay);
        assert_eq!(p.binding, Binding::Push);
        assert_eq!(p.configured_leg_count(), 1);
        assert_eq!(p.leg(true).and_then(PModeLeg::address), Some("https://x"));
        assert_eq!(p.mpc_id, DEFAULT_MPC_ID);
        assert!(!p.id.is_empty());
    }

    #[test]
    fn test_missing_mpc_defaults_on_deserialize() {
        let p: PMode = serde_json::from_str(r#"{"mep":"one-way","binding":"push"}"#).unwrap();
        assert_eq!(p.mpc_id, DEFAULT_MPC_ID);
        assert!(p.initiator.is_none());
        assert!(p.id.is_empty());
    }
}
