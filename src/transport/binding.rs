//! The Transport Binding Contract (spec §4.3, component C): every concrete
//! wire transport implements this trait. Concrete encoders (HTTP framing,
//! an MQTT client, libp2p) are out of scope for this crate per spec §1 —
//! only the contract they must honor lives here.

use crate::did::Did;
use crate::message::HstpMessage;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors a [`TransportBinding`] may raise.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No wire-level route exists for the message's destination/channel.
    #[error("no route for destination")]
    NoRoute,
    /// The binding is not currently connected.
    #[error("binding disconnected")]
    Disconnected,
    /// The send did not complete within the binding's configured timeout.
    #[error("send timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// A protocol- or wire-level failure not covered above.
    #[error("transport failure: {0}")]
    Protocol(String),
}

/// A callback invoked for every inbound message a binding receives.
///
/// Multiple registrations accumulate (broadcast to all) per spec §4.3.
pub type ReceiveHandler = Arc<dyn Fn(HstpMessage) + Send + Sync>;

/// The contract every concrete wire transport implements.
///
/// # Semantic rules (spec §4.3)
/// - `start`/`stop` are idempotent; `stop` releases all network resources
///   within a bounded grace period.
/// - `send` never blocks indefinitely on a single send; an undeliverable
///   message is reported via `Err` rather than hung.
/// - Subscription state is binding-local; subscribing twice to the same
///   channel is a no-op.
/// - A binding delivers each received message to the registered callbacks
///   exactly once per arrival — de-duplication *across* transports is the
///   engine's responsibility (spec §4.5/§4.6), not this trait's.
#[async_trait]
pub trait TransportBinding: Send + Sync {
    /// A human-readable name for this binding instance, used in logs and
    /// the management surface.
    fn name(&self) -> &str;

    /// Starts the binding. Idempotent.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the binding cannot come up.
    async fn start(&self) -> Result<(), TransportError>;

    /// Stops the binding, releasing network resources within a bounded
    /// grace period. Idempotent.
    ///
    /// # Errors
    /// Returns [`TransportError`] if shutdown could not complete cleanly;
    /// callers should still treat the binding as stopped.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Dispatches a single outbound message. The binding chooses direct vs
    /// channel wire path based on which of `destination`/`channel` is set
    /// on `message.header`.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the message cannot be delivered.
    async fn send(&self, message: HstpMessage) -> Result<(), TransportError>;

    /// Installs a callback invoked for every inbound message. Multiple
    /// registrations accumulate.
    fn on_receive(&self, handler: ReceiveHandler);

    /// Whether this binding supports direct (point-to-point) delivery.
    fn supports_point_to_point(&self) -> bool;

    /// Whether this binding supports pub/sub delivery. If `true`, callers
    /// may also call [`Self::subscribe`]/[`Self::unsubscribe`].
    fn supports_pub_sub(&self) -> bool;

    /// Subscribes to `channel`. A no-op if already subscribed.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the binding does not support pub/sub
    /// or the subscribe call itself fails.
    async fn subscribe(&self, channel: &Did) -> Result<(), TransportError>;

    /// Unsubscribes from `channel`. A no-op if not subscribed.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the binding does not support pub/sub
    /// or the unsubscribe call itself fails.
    async fn unsubscribe(&self, channel: &Did) -> Result<(), TransportError>;

    /// Probe used by tests and the management surface: whether `channel`
    /// is currently subscribed on this binding.
    fn is_subscribed(&self, channel: &Did) -> bool;
}
