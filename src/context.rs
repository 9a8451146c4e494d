//! Per-delivery envelope handed to operation handlers.

use crate::did::Did;
use crate::message::HstpMessage;
use crate::resolver::DidDocument;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of credential verification for a single message, cached on the
/// [`MessageContext`] by the engine's authenticate step (spec §4.6 step 3).
#[derive(Debug, Clone)]
pub enum CredentialVerification {
    /// The message carried no credentials to verify.
    NotPresent,
    /// Credentials were present and verified successfully.
    Verified,
    /// Credentials were present but failed verification. Per spec §9's
    /// resolved open question, this downgrades trust but does not by
    /// itself cause the message to be dropped — handlers decide policy.
    Failed {
        /// Human-readable reason, surfaced to handlers and logs.
        reason: String,
    },
}

impl CredentialVerification {
    /// Whether the message's credentials were positively verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// A per-delivery envelope: the inbound message, a handle back to the
/// engine for sending replies, and state cached by the enrichment and
/// authentication stages (spec §3, §4.6).
///
/// Mutation is confined to the fields the engine's own pipeline writes
/// before dispatch; handlers see `MessageContext` as read-only.
pub struct MessageContext {
    /// The inbound message being handled.
    pub message: HstpMessage,
    /// The resolved DID document for `message.header.source`, if
    /// resolution succeeded.
    pub source_document: Option<DidDocument>,
    /// The resolved DID document for `message.header.destination`, if set
    /// and resolution succeeded.
    pub destination_document: Option<DidDocument>,
    /// Outcome of credential verification for this message.
    pub credential_verification: CredentialVerification,
    /// Cooperative cancellation token for this delivery, propagated to any
    /// suspension point the handler awaits on.
    pub cancellation: CancellationToken,
    /// Handle back to the engine, so a handler can send a response without
    /// owning a reference to the whole node.
    pub responder: Arc<dyn Responder>,
}

/// The narrow surface of the engine a handler needs: the ability to send a
/// reply to the message currently being handled.
///
/// Kept as its own trait (rather than handing handlers the full
/// [`crate::engine::HstpEngine`]) so handler unit tests can supply a
/// lightweight fake instead of a whole wired node.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Sends `reply` as a response, via the transport manager.
    async fn send_response(&self, reply: HstpMessage);

    /// This node's own DID, used when replying to a channel message that
    /// had no destination.
    fn node_did(&self) -> &Did;
}

impl MessageContext {
    /// Convenience: the operation name of the message being handled.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.message.header.operation
    }
}
