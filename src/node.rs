//! Lifecycle/config binding (spec §9 component K): the piece that owns both
//! the [`HstpEngine`] and [`TransportManager`] rather than either owning the
//! other, and wires the [`OperationRegistry`], [`ActivityManager`], and
//! [`TransportProviderRegistry`] into one startable/shutdownable unit.
//!
//! Modeled on the base crate's `RouterConfigBuilder` (`message_router/config.rs`):
//! a fluent builder seeded with sensible defaults, consumed once by `build`.

use crate::activity::validator::{ActivityValidator, ShaclValidator};
use crate::activity::{ActivityManager, ActivityManagerConfig};
use crate::builtin_ops::PingHandler;
use crate::config::NodeConfig;
use crate::domain_types::DedupCacheSize;
use crate::engine::{CredentialExtractor, HstpEngine, NoCredentials};
use crate::operation::{OperationHandler, OperationRegistry};
use crate::resolver::{CredentialVerifier, DidResolver, NullDidInfrastructure};
use crate::rest_api::ManagementState;
use crate::transport::{TransportBinding, TransportError, TransportManager, TransportProviderRegistry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Errors raised bringing a [`Node`] up or down.
#[derive(Debug, thiserror::Error)]
pub enum NodeStartError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Builds a [`Node`] from a [`NodeConfig`] plus whichever collaborators a
/// deployment has available, defaulting every optional dependency to a
/// harmless no-op so a caller can stand up a node with just a config.
pub struct NodeBuilder {
    config: NodeConfig,
    resolver: Arc<dyn DidResolver>,
    verifier: Arc<dyn CredentialVerifier>,
    credentials: Arc<dyn CredentialExtractor>,
    validator: Arc<dyn ActivityValidator>,
    activity_config: ActivityManagerConfig,
    operations: Vec<Arc<dyn OperationHandler>>,
    bindings: Vec<Arc<dyn TransportBinding>>,
    providers: Arc<TransportProviderRegistry>,
}

impl NodeBuilder {
    /// Starts a builder for `config`, defaulting to [`NullDidInfrastructure`]
    /// for DID resolution/credential verification, [`NoCredentials`] for
    /// credential extraction, [`ShaclValidator`] for activity validation, the
    /// built-in `ping` handler, and no transport bindings or providers.
    #[must_use]
    pub fn new(config: NodeConfig) -> Self {
        let null_did = Arc::new(NullDidInfrastructure);
        Self {
            config,
            resolver: null_did.clone(),
            verifier: null_did,
            credentials: Arc::new(NoCredentials),
            validator: Arc::new(ShaclValidator::new()),
            activity_config: ActivityManagerConfig::default(),
            operations: vec![Arc::new(PingHandler)],
            bindings: Vec::new(),
            providers: Arc::new(TransportProviderRegistry::new()),
        }
    }

    /// Overrides the DID resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Overrides the credential verifier.
    #[must_use]
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Overrides the credential extractor.
    #[must_use]
    pub fn credential_extractor(mut self, credentials: Arc<dyn CredentialExtractor>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Overrides the activity validator.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn ActivityValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Overrides the activity manager's concurrency ceiling and grace period.
    #[must_use]
    pub fn activity_config(mut self, activity_config: ActivityManagerConfig) -> Self {
        self.activity_config = activity_config;
        self
    }

    /// Registers an additional operation handler (built-in `ping` is always
    /// present unless a later call overwrites its registry entry).
    #[must_use]
    pub fn with_operation(mut self, handler: Arc<dyn OperationHandler>) -> Self {
        self.operations.push(handler);
        self
    }

    /// Adds a transport binding to start and route through.
    #[must_use]
    pub fn with_binding(mut self, binding: Arc<dyn TransportBinding>) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Overrides the transport provider registry, e.g. one pre-populated
    /// with concrete providers discovered at process start.
    #[must_use]
    pub fn provider_registry(mut self, providers: Arc<TransportProviderRegistry>) -> Self {
        self.providers = providers;
        self
    }

    /// Consumes the builder, constructing the wired [`Node`]. Infallible:
    /// every collaborator either has a no-op default or was supplied
    /// directly by the caller.
    #[must_use]
    pub fn build(self) -> Node {
        let registry = Arc::new(OperationRegistry::new());
        registry.register_all(self.operations);

        let transport = Arc::new(TransportManager::new(self.bindings, DedupCacheSize::default()));

        let engine = Arc::new(HstpEngine::new(
            self.config.node_id.clone(),
            Arc::clone(&registry),
            Arc::clone(&transport),
            self.resolver,
            self.verifier,
            self.credentials,
            DedupCacheSize::default(),
        ));

        let activities = Arc::new(ActivityManager::new(self.validator, self.activity_config));

        Node {
            config: self.config,
            engine,
            transport,
            activities,
            registry,
            providers: self.providers,
        }
    }
}

/// A running (or not-yet-started) HSTP node: the engine, transport manager,
/// activity manager, operation registry, and transport provider registry,
/// bound together under one lifecycle.
///
/// Neither the engine nor the transport manager owns the other — both are
/// owned here (spec §9), which is why `start`/`shutdown` live on `Node`
/// rather than on either collaborator.
pub struct Node {
    config: NodeConfig,
    engine: Arc<HstpEngine>,
    transport: Arc<TransportManager>,
    activities: Arc<ActivityManager>,
    registry: Arc<OperationRegistry>,
    providers: Arc<TransportProviderRegistry>,
}

impl Node {
    /// This node's configuration document.
    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The HSTP engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<HstpEngine> {
        &self.engine
    }

    /// The transport manager.
    #[must_use]
    pub fn transport(&self) -> &Arc<TransportManager> {
        &self.transport
    }

    /// The activity manager.
    #[must_use]
    pub fn activities(&self) -> &Arc<ActivityManager> {
        &self.activities
    }

    /// The operation registry.
    #[must_use]
    pub fn operations(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// The transport provider registry.
    #[must_use]
    pub fn providers(&self) -> &Arc<TransportProviderRegistry> {
        &self.providers
    }

    /// Starts every transport binding and begins routing inbound messages
    /// to the engine, each delivery handled on its own task so a slow
    /// handler never blocks a binding's receive loop.
    ///
    /// # Errors
    /// Returns [`NodeStartError`] if any binding fails to start.
    pub async fn start(&self) -> Result<(), NodeStartError> {
        let engine = Arc::clone(&self.engine);
        self.transport
            .start(Arc::new(move |message| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.handle_inbound(message, CancellationToken::new()).await;
                });
            }))
            .await?;
        Ok(())
    }

    /// Shuts the node down: stops accepting new activity work, cancels
    /// in-flight activities within their grace period, stops every
    /// transport binding, and releases provider-level resources.
    pub async fn shutdown(&self) {
        self.activities.shutdown().await;
        if let Err(e) = self.transport.stop().await {
            tracing::warn!(error = %e, "error stopping transport manager during shutdown");
        }
        self.providers.shutdown();
    }

    /// Shared state for the management REST API (spec §9's ambient
    /// management HTTP surface).
    #[must_use]
    pub fn management_state(&self) -> ManagementState {
        ManagementState {
            activities: Arc::clone(&self.activities),
        }
    }
}
