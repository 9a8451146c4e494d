//! Per-transport configuration records, as they appear under a node
//! config's `transports:` list (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One entry of a node config's `transports:` list.
///
/// `config` is a free-form map handed to the named provider's
/// [`crate::transport::provider::TransportProvider::create_instance`] —
/// its shape is provider-specific and not validated at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Instance name, unique within a node (e.g. `"http-public"`).
    pub name: String,
    /// The registered [`crate::transport::provider::TransportProvider`] name
    /// that constructs this instance (e.g. `"http"`, `"mqtt"`, `"p2p"`).
    #[serde(alias = "type")]
    pub provider: String,
    /// Whether this transport is started. Disabled entries are kept in the
    /// config but skipped at startup, so operators can comment a transport
    /// out without deleting its settings.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Provider-specific settings, already env-interpolated by
    /// [`crate::config`] by the time this reaches a provider.
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl TransportConfig {
    /// Convenience constructor for tests and programmatic config building.
    #[must_use]
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            enabled: true,
            config: HashMap::new(),
        }
    }

    /// Builder-style setter for a single config entry.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Builder-style disable.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enabled_is_true() {
        let json = r#"{"name": "http-public", "provider": "http"}"#;
        let config: TransportConfig = serde_json::from_str(json).unwrap();
        assert!(config.enabled);
        assert!(config.config.is_empty());
    }

    #[test]
    fn builder_sets_fields() {
        let config = TransportConfig::new("mqtt-main", "mqtt")
            .with_setting("broker_url", "tcp://localhost:1883")
            .disabled();
        assert!(!config.enabled);
        assert_eq!(
            config.config.get("broker_url").and_then(Value::as_str),
            Some("tcp://localhost:1883")
        );
    }
}
