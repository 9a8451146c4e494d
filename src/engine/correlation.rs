//! Correlation table: matches an inbound reply back to the outbound
//! `expectResponse=true` send that is awaiting it (spec §4.6, §5).

use crate::domain_types::ResponseTimeoutMs;
use crate::message::HstpMessage;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::timeout;
use uuid::Uuid;

/// Raised when an awaited reply never arrived in time.
#[derive(Debug, thiserror::Error)]
#[error("no reply received within the configured timeout")]
pub struct CorrelationTimeout;

/// Tracks in-flight direct sends awaiting a correlated reply.
///
/// Keyed by the outbound message's own id (the reply's `inReplyTo`, per
/// spec §3). Entries are short-lived: inserted just before a send, removed
/// either by [`CorrelationTable::resolve`] on arrival or by the waiter's own
/// timeout. The critical section touching the map is a single `insert`
/// or `remove` — never held across an `.await` on the oneshot channel
/// itself (spec §5's "no suspension while holding a correlation lock").
#[derive(Default)]
pub struct CorrelationTable {
    waiters: DashMap<Uuid, oneshot::Sender<HstpMessage>>,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `key` (conventionally the outbound message's
    /// id) and waits up to `timeout_ms` for [`Self::resolve`] to be called
    /// with a matching reply.
    ///
    /// # Errors
    /// Returns [`CorrelationTimeout`] if no reply arrives in time; the
    /// waiter entry is removed either way.
    pub async fn await_reply(
        &self,
        key: Uuid,
        timeout_ms: ResponseTimeoutMs,
    ) -> Result<HstpMessage, CorrelationTimeout> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(key, tx);
        let result = timeout(timeout_ms.as_duration(), rx).await;
        self.waiters.remove(&key);
        match result {
            Ok(Ok(message)) => Ok(message),
            _ => Err(CorrelationTimeout),
        }
    }

    /// Delivers `reply` to the waiter registered under `key`, if any is
    /// still waiting. Returns `true` if a waiter received it, `false` if
    /// there was no matching waiter (already timed out, or an unsolicited
    /// reply) — in which case the reply should be treated as a normal
    /// inbound delivery instead.
    #[must_use]
    pub fn resolve(&self, key: Uuid, reply: HstpMessage) -> bool {
        match self.waiters.remove(&key) {
            Some((_, tx)) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Number of sends currently awaiting a reply.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether no sends are currently awaiting a reply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::Did;
    use crate::domain_types::StatusCode;
    use crate::message::{HeaderBuilder, Payload};

    fn did(s: &str) -> Did {
        s.parse().unwrap()
    }

    fn reply_message(in_reply_to: Uuid) -> HstpMessage {
        let header = HeaderBuilder::new("pong", did("did:example:bob"))
            .destination(did("did:example:alice"))
            .in_reply_to(in_reply_to.into(), StatusCode::ok())
            .build()
            .unwrap();
        HstpMessage::new(header, Payload::empty())
    }

    #[tokio::test]
    async fn resolve_delivers_to_a_waiting_caller() {
        let table = CorrelationTable::new();
        let key = Uuid::new_v4();
        let table_ref = &table;
        let (waited, resolved) = tokio::join!(
            table_ref.await_reply(key, ResponseTimeoutMs::default()),
            async {
                // Give the waiter a tick to register before resolving.
                tokio::task::yield_now().await;
                table_ref.resolve(key, reply_message(key))
            }
        );
        assert!(resolved);
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn resolve_without_a_waiter_returns_false() {
        let table = CorrelationTable::new();
        let key = Uuid::new_v4();
        assert!(!table.resolve(key, reply_message(key)));
    }

    #[tokio::test]
    async fn unmatched_wait_times_out() {
        let table = CorrelationTable::new();
        let key = Uuid::new_v4();
        let short = ResponseTimeoutMs::try_new(1).unwrap();
        let result = table.await_reply(key, short).await;
        assert!(result.is_err());
        assert!(table.is_empty());
    }
}
