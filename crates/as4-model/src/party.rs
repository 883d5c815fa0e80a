//! Trading partner identity.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Role URI used when a party is created without an explicit role.
pub const DEFAULT_ROLE: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/defaultRole";

/// A trading partner.
///
/// Equality and hashing only consider `id_type` and `id`; role and
/// credentials describe how the party takes part in an agreement, not who
/// it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    /// Identifier scheme, e.g. `urn:oasis:names:tc:ebcore:partyid-type:iso6523:0088`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,

    pub id: String,

    pub role: String,

    /// Endpoint authentication credentials, if the agreement uses them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Party {
    pub fn new(id_type: Option<&str>, id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id_type: id_type.map(str::to_string),
            id: id.into(),
            role: role.into(),
            username: None,
            password: None,
        }
    }

    /// A party with no identifier scheme and the default role.
    pub fn with_default_role(id: impl Into<String>) -> Self {
        Self::new(None, id, DEFAULT_ROLE)
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }

    /// `type:id` when a scheme is set, plain `id` otherwise.
    pub fn qualified_id(&self) -> String {
        match &self.id_type {
            Some(t) => format!("{t}:{}", self.id),
            None => self.id.clone(),
        }
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.id_type == other.id_type && self.id == other.id
    }
}

impl Eq for Party {}

impl Hash for Party {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id_type.hash(state);
        self.id.hash(state);
    }
}
