//! Header-level descriptors of inbound ebMS messages.
//!
//! The SOAP layer extracts these from the envelope; the engine never sees
//! XML.

use serde::{Deserialize, Serialize};

use crate::mep::MessageKind;

/// Routing and business header of a user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessageInfo {
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub from_party_id: String,
    pub to_party_id: String,
    pub service: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpc_id: Option<String>,
}

/// Header of a receipt, error or pull-request signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMessageInfo {
    pub kind: MessageKind,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpc_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageInfo {
    User(UserMessageInfo),
    Signal(SignalMessageInfo),
}

impl MessageInfo {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageInfo::User(_) => MessageKind::UserMessage,
            MessageInfo::Signal(s) => s.kind,
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            MessageInfo::User(u) => &u.message_id,
            MessageInfo::Signal(s) => &s.message_id,
        }
    }

    pub fn mpc_id(&self) -> Option<&str> {
        match self {
            MessageInfo::User(u) => u.mpc_id.as_deref(),
            MessageInfo::Signal(s) => s.mpc_id.as_deref(),
        }
    }
}
