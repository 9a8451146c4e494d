//! Transport Provider Registry (spec §4.4, component D): discovers
//! transport providers and constructs named instances from configuration.

use crate::transport::binding::{TransportBinding, TransportError};
use crate::transport::protocol::ProtocolTag;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while constructing transport instances from configuration.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The config blob/map was missing a required field or had the wrong
    /// shape for this provider.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
    /// The underlying binding failed to start.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A factory that yields named [`TransportBinding`] instances from
/// configuration (spec §4.4).
///
/// A process may host several providers (`http`, `mqtt`, `p2p`); each
/// produces zero or more named instances. Concrete providers (wiring up an
/// actual HTTP/MQTT/libp2p client) live outside this crate — only the
/// contract lives here, per spec §1's exclusion of concrete wire encoders.
pub trait TransportProvider: Send + Sync {
    /// This provider's tag, e.g. `"http"`.
    fn name(&self) -> &str;

    /// The protocol tags this provider can produce bindings for.
    fn supported_protocols(&self) -> Vec<ProtocolTag>;

    /// Creates every instance described by a raw config blob (e.g. the
    /// parsed body of one transport config file's `config:` block, already
    /// env-interpolated by [`crate::config`]).
    ///
    /// # Errors
    /// Returns [`ProviderError`] if any described instance is invalid.
    fn create_instances(&self, config_blob: &Value) -> Result<Vec<Arc<dyn TransportBinding>>, ProviderError>;

    /// Creates a single instance from a flat key/value config map.
    ///
    /// # Errors
    /// Returns [`ProviderError`] if the config is invalid. Returns `Ok(None)`
    /// if this provider declines the request for a non-error reason (e.g.
    /// `enabled: false`).
    fn create_instance(&self, config: &HashMap<String, Value>) -> Result<Option<Arc<dyn TransportBinding>>, ProviderError>;

    /// Releases any provider-level resources (not individual instances,
    /// which are owned and stopped by the [`crate::transport::manager::TransportManager`]).
    fn shutdown(&self) {}
}

/// Registry of discovered [`TransportProvider`]s plus the named instances
/// each has constructed.
///
/// Discovery replaces the host platform's service-provider mechanism with
/// an explicit registration table (spec §9): a process populates this at
/// startup from a generated list or plugin manifest, not reflection.
pub struct TransportProviderRegistry {
    providers: DashMap<String, Arc<dyn TransportProvider>>,
    instances: DashMap<String, Arc<dyn TransportBinding>>,
}

impl Default for TransportProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Registers a provider, keyed by [`TransportProvider::name`].
    pub fn register_provider(&self, provider: Arc<dyn TransportProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Looks up a provider by name.
    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn TransportProvider>> {
        self.providers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Builds and registers every instance a provider's config blob
    /// describes, keyed by `"{provider}/{instance_name}"`.
    ///
    /// # Errors
    /// Returns [`ProviderError`] if the provider is unknown or any
    /// described instance is invalid.
    pub fn create_instances(
        &self,
        provider_name: &str,
        instance_name_prefix: &str,
        config_blob: &Value,
    ) -> Result<Vec<Arc<dyn TransportBinding>>, ProviderError> {
        let provider = self.get_provider(provider_name).ok_or_else(|| {
            ProviderError::InvalidConfig(format!("unknown transport provider: {provider_name}"))
        })?;
        let instances = provider.create_instances(config_blob)?;
        for (i, instance) in instances.iter().enumerate() {
            let key = format!("{instance_name_prefix}/{i}");
            self.instances.insert(key, Arc::clone(instance));
        }
        Ok(instances)
    }

    /// Looks up a previously constructed named instance.
    #[must_use]
    pub fn get_instance(&self, name: &str) -> Option<Arc<dyn TransportBinding>> {
        self.instances.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// All constructed instances, across all providers.
    #[must_use]
    pub fn get_all_instances(&self) -> Vec<Arc<dyn TransportBinding>> {
        self.instances.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Shuts down every registered provider.
    pub fn shutdown(&self) {
        for entry in &self.providers {
            entry.value().shutdown();
        }
    }
}
