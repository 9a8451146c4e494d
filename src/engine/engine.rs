//! The HSTP Engine (spec §4.6, component F): the message dispatch pipeline
//! that turns an inbound [`HstpMessage`] into a handler invocation, and an
//! outbound one into a routed, optionally correlated, send.

use crate::context::{CredentialVerification, MessageContext, Responder};
use crate::did::Did;
use crate::domain_types::{DedupCacheSize, ResponseTimeoutMs, StatusCode};
use crate::engine::correlation::{CorrelationTable, CorrelationTimeout};
use crate::message::{HeaderBuilder, HstpMessage, Payload};
use crate::operation::registry::OperationRegistry;
use crate::resolver::{Credential, CredentialVerifier, DidResolver};
use crate::transport::dedup::DedupCache;
use crate::transport::manager::{RoutingError, TransportManager};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Errors raised while dispatching or sending through the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No handler is registered for the message's `operation`.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    /// Message routing failed outbound.
    #[error(transparent)]
    Routing(#[from] RoutingError),
    /// An awaited reply never arrived.
    #[error(transparent)]
    Timeout(#[from] CorrelationTimeout),
}

/// Extracts a sidecar credential from a message, if present.
///
/// HSTP carries credentials transport-agnostically (spec §4.6 step 3); this
/// crate does not prescribe where in the payload/header they live, so this
/// hook is deliberately a trait rather than a fixed field, letting a
/// deployment plug in its own convention.
pub trait CredentialExtractor: Send + Sync {
    /// Extracts a credential asserted by the message's `source`, if any.
    fn extract(&self, message: &HstpMessage) -> Option<Credential>;
}

/// An extractor that never finds a credential — the default when a
/// deployment has no credential-carrying convention configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialExtractor for NoCredentials {
    fn extract(&self, _message: &HstpMessage) -> Option<Credential> {
        None
    }
}

/// The message dispatch pipeline: de-dup, enrich, authenticate, dispatch,
/// reply (spec §4.6 steps 1-6).
pub struct HstpEngine {
    node_did: Did,
    registry: Arc<OperationRegistry>,
    transport: Arc<TransportManager>,
    resolver: Arc<dyn DidResolver>,
    verifier: Arc<dyn CredentialVerifier>,
    credentials: Arc<dyn CredentialExtractor>,
    dedup: DedupCache,
    correlation: CorrelationTable,
}

impl HstpEngine {
    /// Builds an engine. `dedup_capacity` sizes the inbound de-dup LRU this
    /// engine applies to deliveries handed to it directly (as distinct from
    /// the [`TransportManager`]'s own cross-transport de-dup, spec §4.5);
    /// keeping both layers means a message re-delivered after passing
    /// through the transport manager once is still caught if it is
    /// re-submitted to the engine out of band (e.g. a test harness).
    #[must_use]
    pub fn new(
        node_did: Did,
        registry: Arc<OperationRegistry>,
        transport: Arc<TransportManager>,
        resolver: Arc<dyn DidResolver>,
        verifier: Arc<dyn CredentialVerifier>,
        credentials: Arc<dyn CredentialExtractor>,
        dedup_capacity: DedupCacheSize,
    ) -> Self {
        Self {
            node_did,
            registry,
            transport,
            resolver,
            verifier,
            credentials,
            dedup: DedupCache::new(dedup_capacity),
            correlation: CorrelationTable::new(),
        }
    }

    /// This node's own DID.
    #[must_use]
    pub fn node_did(&self) -> &Did {
        &self.node_did
    }

    /// Handles one inbound message end to end (spec §4.6).
    ///
    /// 1. De-dup by `header.id`; a repeat is dropped silently.
    /// 2. If the message is a reply (`in_reply_to` set) and a caller is
    ///    awaiting it, correlate and return — it never reaches a handler.
    /// 3. Enrich: resolve `source`/`destination` DID documents, best-effort.
    /// 4. Authenticate: verify a sidecar credential if one is present.
    /// 5. Dispatch to the registered [`crate::operation::handler::OperationHandler`];
    ///    `UnknownOperation` yields a `501` reply when one was expected.
    /// 6. Send the handler's reply, if any, via the transport manager.
    #[instrument(skip(self, message, cancellation), fields(operation = %message.header.operation, id = %message.header.id))]
    pub async fn handle_inbound(&self, message: HstpMessage, cancellation: CancellationToken) {
        if self.dedup.record_and_check_duplicate(message.header.id) {
            debug!("dropping duplicate inbound message");
            return;
        }

        if let Some(in_reply_to) = message.header.in_reply_to {
            let key: Uuid = in_reply_to.into();
            if self.correlation.resolve(key, message) {
                debug!("delivered correlated reply to waiting caller");
                return;
            }
            warn!(%in_reply_to, "no waiter for correlated reply; dropping");
            return;
        }

        let mut ctx = self.build_context(message, cancellation).await;
        let reply = self.dispatch(&mut ctx).await;

        if let Some(reply) = reply {
            if let Err(e) = self.transport.send(reply).await {
                warn!(error = %e, "failed to send dispatch reply");
            }
        }
    }

    async fn build_context(&self, message: HstpMessage, cancellation: CancellationToken) -> MessageContext {
        let source_document = self.resolver.resolve(&message.header.source).await.ok();
        let destination_document = match &message.header.destination {
            Some(destination) => self.resolver.resolve(destination).await.ok(),
            None => None,
        };

        let credential_verification = match self.credentials.extract(&message) {
            None => CredentialVerification::NotPresent,
            Some(credential) => match self.verifier.verify(&message.header.source, &credential).await {
                Ok(()) => CredentialVerification::Verified,
                Err(e) => CredentialVerification::Failed { reason: e.to_string() },
            },
        };

        MessageContext {
            message,
            source_document,
            destination_document,
            credential_verification,
            cancellation,
            responder: Arc::new(EngineResponder {
                transport: Arc::clone(&self.transport),
                node_did: self.node_did.clone(),
            }),
        }
    }

    async fn dispatch(&self, ctx: &mut MessageContext) -> Option<HstpMessage> {
        let operation = ctx.operation().to_string();
        let expect_response = ctx.message.header.expect_response;

        let handler = match self.registry.resolve(&operation) {
            Some(handler) => handler,
            None => {
                info!(%operation, "no handler registered for operation");
                return expect_response.then(|| {
                    ctx.message.reply(&self.node_did, "reply", StatusCode::not_implemented(), Payload::empty())
                });
            }
        };

        match handler.handle(ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(%operation, error = %e, "handler returned an error");
                expect_response.then(|| {
                    ctx.message.reply(&self.node_did, "reply", StatusCode::internal_error(), Payload::empty())
                })
            }
        }
    }

    /// Sends `message` outbound, returning as soon as the transport manager
    /// accepts it for delivery — does not wait for a reply. Use
    /// [`Self::send_and_await_reply`] for a correlated round trip.
    ///
    /// # Errors
    /// Returns [`EngineError::Routing`] if no capable binding exists.
    pub async fn send(&self, message: HstpMessage) -> Result<(), EngineError> {
        self.transport.send(message).await?;
        Ok(())
    }

    /// Sends a direct message with `expect_response=true` and awaits its
    /// correlated reply (spec §4.6's round-trip case).
    ///
    /// # Errors
    /// Returns [`EngineError::Routing`] if the send itself fails, or
    /// [`EngineError::Timeout`] if no reply arrives within `timeout_ms`.
    pub async fn send_and_await_reply(
        &self,
        message: HstpMessage,
        timeout_ms: ResponseTimeoutMs,
    ) -> Result<HstpMessage, EngineError> {
        let key: Uuid = message.header.id.into();
        let (send_result, wait_result) = tokio::join!(
            self.transport.send(message),
            self.correlation.await_reply(key, timeout_ms)
        );
        send_result?;
        Ok(wait_result?)
    }

    /// Convenience: builds and sends a `ping` to `destination`, awaiting the
    /// correlated `pong` (spec §4.9).
    ///
    /// # Errors
    /// See [`Self::send_and_await_reply`].
    pub async fn ping(&self, destination: Did, timeout_ms: ResponseTimeoutMs) -> Result<HstpMessage, EngineError> {
        let header = HeaderBuilder::new("ping", self.node_did.clone())
            .destination(destination)
            .expect_response(true)
            .build()
            .expect("ping headers always satisfy the builder's invariants");
        let message = HstpMessage::new(header, Payload::empty());
        self.send_and_await_reply(message, timeout_ms).await
    }
}

struct EngineResponder {
    transport: Arc<TransportManager>,
    node_did: Did,
}

#[async_trait::async_trait]
impl Responder for EngineResponder {
    async fn send_response(&self, reply: HstpMessage) {
        if let Err(e) = self.transport.send(reply).await {
            warn!(error = %e, "failed to send handler-initiated response");
        }
    }

    fn node_did(&self) -> &Did {
        &self.node_did
    }
}
