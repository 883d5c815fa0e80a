//! Message exchange patterns, bindings and message kinds.
//!
//! All three enums parse from the ebMS3 core namespace URIs as well as from
//! short kebab-case names, and serialize as the short names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// ebMS3 core namespace shared by all MEP and binding URIs.
pub const EBMS3_NS: &str = "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/";

/// Message exchange pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mep {
    /// One business message, acknowledged at most by a receipt or error.
    OneWay,
    /// A request and a response user message.
    TwoWay,
}

impl Mep {
    pub const ALL: [Mep; 2] = [Mep::OneWay, Mep::TwoWay];

    /// Number of legs a PMode with this pattern must configure.
    pub fn leg_count(self) -> usize {
        match self {
            Mep::OneWay => 1,
            Mep::TwoWay => 2,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Mep::OneWay => "one-way",
            Mep::TwoWay => "two-way",
        }
    }

    pub fn uri(self) -> String {
        let local = match self {
            Mep::OneWay => "oneWay",
            Mep::TwoWay => "twoWay",
        };
        format!("{EBMS3_NS}{local}")
    }
}

impl fmt::Display for Mep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Mep {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.strip_prefix(EBMS3_NS).unwrap_or(s);
        match local {
            "oneWay" | "one-way" => Ok(Mep::OneWay),
            "twoWay" | "two-way" => Ok(Mep::TwoWay),
            _ => Err(ModelError::UnknownMep(s.to_string())),
        }
    }
}

/// Transport choreography realizing a MEP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    Push,
    Pull,
    Sync,
    PushPush,
    PushPull,
    PullPush,
}

impl Binding {
    pub const ALL: [Binding; 6] = [
        Binding::Push,
        Binding::Pull,
        Binding::Sync,
        Binding::PushPush,
        Binding::PushPull,
        Binding::PullPush,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            Binding::Push => "push",
            Binding::Pull => "pull",
            Binding::Sync => "sync",
            Binding::PushPush => "push-push",
            Binding::PushPull => "push-pull",
            Binding::PullPush => "pull-push",
        }
    }

    pub fn uri(self) -> String {
        let local = match self {
            Binding::Push => "push",
            Binding::Pull => "pull",
            Binding::Sync => "sync",
            Binding::PushPush => "pushAndPush",
            Binding::PushPull => "pushAndPull",
            Binding::PullPush => "pullAndPush",
        };
        format!("{EBMS3_NS}{local}")
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Binding {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.strip_prefix(EBMS3_NS).unwrap_or(s);
        match local {
            "push" => Ok(Binding::Push),
            "pull" => Ok(Binding::Pull),
            "sync" => Ok(Binding::Sync),
            "pushAndPush" | "push-push" => Ok(Binding::PushPush),
            "pushAndPull" | "push-pull" => Ok(Binding::PushPull),
            "pullAndPush" | "pull-push" => Ok(Binding::PullPush),
            _ => Err(ModelError::UnknownBinding(s.to_string())),
        }
    }
}

/// Kind of ebMS message as seen by the decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    UserMessage,
    PullRequest,
    Receipt,
    Error,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::UserMessage,
        MessageKind::PullRequest,
        MessageKind::Receipt,
        MessageKind::Error,
    ];

    pub fn is_receipt_or_error(self) -> bool {
        matches!(self, MessageKind::Receipt | MessageKind::Error)
    }

    pub fn is_user_message(self) -> bool {
        self == MessageKind::UserMessage
    }

    /// Everything but a user message travels as an ebMS signal.
    pub fn is_signal(self) -> bool {
        !self.is_user_message()
    }

    pub fn short_name(self) -> &'static str {
        match self {
            MessageKind::UserMessage => "user-message",
            MessageKind::PullRequest => "pull-request",
            MessageKind::Receipt => "receipt",
            MessageKind::Error => "error",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for MessageKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user-message" | "UserMessage" => Ok(MessageKind::UserMessage),
            "pull-request" | "PullRequest" => Ok(MessageKind::PullRequest),
            "receipt" | "Receipt" => Ok(MessageKind::Receipt),
            "error" | "Error" => Ok(MessageKind::Error),
            _ => Err(ModelError::UnknownMessageKind(s.to_string())),
        }
    }
}
