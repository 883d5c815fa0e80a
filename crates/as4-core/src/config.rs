//! Configuration types for the AS4 engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use as4_model::TableRevision;

use crate::error::As4Error;

/// Configuration for the engine context. Immutable once the context is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct As4Config {
    /// Own identity and defaults for generated PModes.
    pub endpoint: EndpointConfig,

    /// Profile selection.
    pub profile: ProfileConfig,

    /// Duplicate detection retention.
    pub duplicates: DuplicateConfig,

    /// Backing store of the registries.
    pub storage: StorageConfig,

    /// Incoming dump.
    pub dump: DumpConfig,

    /// MEP/binding table revision used for inbound classification.
    pub mep_table: TableRevision,
}

impl As4Config {
    /// Rejects configurations the context cannot start with.
    pub fn validate(&self) -> Result<(), As4Error> {
        if self.endpoint.own_id.trim().is_empty() {
            return Err(As4Error::Config("endpoint.own_id must not be empty".to_string()));
        }
        if matches!(&self.endpoint.default_responder_id, Some(id) if id.trim().is_empty()) {
            return Err(As4Error::Config(
                "endpoint.default_responder_id is present but empty".to_string(),
            ));
        }
        if self.duplicates.cleanup_interval_secs == 0 {
            return Err(As4Error::Config(
                "duplicates.cleanup_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Process identity.
    pub own_id: String,

    /// Responder of generated default PModes; falls back to `own_id`.
    pub default_responder_id: Option<String>,

    /// Leg-1 address of generated default PModes.
    pub default_address: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            own_id: "as4-endpoint".to_string(),
            default_responder_id: None,
            default_address: None,
        }
    }
}

impl EndpointConfig {
    pub fn effective_responder_id(&self) -> &str {
        self.default_responder_id.as_deref().unwrap_or(&self.own_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Profile id; `None` selects the registered default profile.
    pub active: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// How long a message id is remembered.
    pub retention_minutes: u64,

    /// Period of the background eviction task.
    pub cleanup_interval_secs: u64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            retention_minutes: 10,
            cleanup_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    #[default]
    Memory,
    /// Sled database directory shared by all registries.
    Sled { path: PathBuf },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Directory for the file-based incoming dumper; `None` disables it.
    pub directory: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = As4Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.duplicates.retention_minutes, 10);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.endpoint.effective_responder_id(), "as4-endpoint");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: As4Config = serde_json::from_str(
            r#"{"endpoint": {"own_id": "gw-1"}, "storage": {"backend": {"Sled": {"path": "/tmp/as4"}}}}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint.own_id, "gw-1");
        assert_eq!(config.duplicates.cleanup_interval_secs, 60);
        assert_eq!(
            config.storage.backend,
            StorageBackend::Sled { path: PathBuf::from("/tmp/as4") }
        );
    }

    #[test]
    fn test_validation_rejects_empty_identity() {
        let mut config = As4Config::default();
        config.endpoint.own_id = " ".to_string();
        assert!(matches!(config.validate(), Err(As4Error::Config(_))));

        let mut config = As4Config::default();
        config.endpoint.default_responder_id = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = As4Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: As4Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.endpoint.own_id, config.endpoint.own_id);
        assert_eq!(parsed.mep_table, TableRevision::V1);
    }
}
