//! The `OperationHandler` contract (spec §4.1).

use crate::context::MessageContext;
use crate::message::HstpMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Error a handler's [`OperationHandler::handle`] may return. The engine
/// catches this, logs it, and replies with `status=500` per spec §7's
/// `HandlerError` row — it never propagates into the engine's own control
/// flow.
#[derive(Debug, Error)]
pub struct HandlerError {
    /// A stable machine-readable code, carried in the `500` reply body.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl HandlerError {
    /// Builds a handler error with the given stable code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A handler bound to a single operation name.
///
/// Handlers run on the engine's dispatch path (spec §4.6 step 5) and may
/// suspend/await — the manager/engine treats every `handle` call as a
/// suspension point (spec §5).
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// The operation name this handler is registered under.
    fn operation(&self) -> &str;

    /// Handles one delivery.
    ///
    /// Returning `Ok(Some(message))` hands the engine a reply to send;
    /// `Ok(None)` means the handler replied itself via
    /// [`crate::context::Responder::send_response`] (or doesn't reply at
    /// all, e.g. for a channel delivery).
    ///
    /// # Errors
    /// Returns [`HandlerError`] on failure; the engine turns this into a
    /// `status=500` reply when the inbound message expected one.
    async fn handle(&self, ctx: &mut MessageContext) -> Result<Option<HstpMessage>, HandlerError>;
}
