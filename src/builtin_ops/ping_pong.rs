//! Reference operations: `ping`/`pong` (spec §4.9, component G).
//!
//! These exist to exercise the dispatch pipeline end to end and to give
//! every node a trivial liveness check that needs no application-specific
//! wiring. A node is free to not register [`PingHandler`] at all; nothing
//! else in this crate depends on it being present.

use crate::context::MessageContext;
use crate::did::Did;
use crate::domain_types::{MessageId, StatusCode};
use crate::message::{HstpMessage, Payload};
use crate::operation::handler::{HandlerError, OperationHandler};
use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// Handles `ping`: replies `pong` with the same payload, for direct
/// messages that expect a response. Channel pings and pings with
/// `expect_response=false` are acknowledged with no reply, since nothing
/// is waiting to correlate one.
#[derive(Debug, Default, Clone, Copy)]
pub struct PingHandler;

#[async_trait]
impl OperationHandler for PingHandler {
    fn operation(&self) -> &str {
        "ping"
    }

    async fn handle(&self, ctx: &mut MessageContext) -> Result<Option<HstpMessage>, HandlerError> {
        let is_direct = ctx.message.header.destination.is_some();
        if !ctx.message.header.expect_response || !is_direct {
            return Ok(None);
        }
        let payload = ctx
            .message
            .payload
            .consume_to_bytes()
            .map(Payload::from_bytes)
            .unwrap_or_else(|_| Payload::empty());
        let reply = ctx.message.reply(ctx.responder.node_did(), "pong", StatusCode::ok(), payload);
        Ok(Some(reply))
    }
}

/// Whether `pong` is the `pong` reply to the ping identified by `ping_id`,
/// per spec §8's round-trip law: `operation == "pong" && inReplyTo ==
/// ping.id`.
#[must_use]
pub fn is_pong_response(ping_id: MessageId, pong: &HstpMessage) -> bool {
    pong.header.operation == "pong" && pong.header.in_reply_to == Some(ping_id)
}

/// Round-trip time between a ping's send and its pong's arrival, given the
/// ping's own timestamp and the pong's. Returns `None` if the pong's
/// timestamp precedes the ping's (clock skew across nodes).
#[must_use]
pub fn round_trip_time(ping_sent_at: SystemTime, pong_received_at: SystemTime) -> Option<Duration> {
    pong_received_at.duration_since(ping_sent_at).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Responder;
    use crate::message::HeaderBuilder;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn did(s: &str) -> Did {
        s.parse().unwrap()
    }

    struct NullResponder(Did);

    #[async_trait]
    impl Responder for NullResponder {
        async fn send_response(&self, _reply: HstpMessage) {}
        fn node_did(&self) -> &Did {
            &self.0
        }
    }

    fn context(message: HstpMessage) -> MessageContext {
        MessageContext {
            message,
            source_document: None,
            destination_document: None,
            credential_verification: crate::context::CredentialVerification::NotPresent,
            cancellation: CancellationToken::new(),
            responder: Arc::new(NullResponder(did("did:example:node"))),
        }
    }

    #[tokio::test]
    async fn direct_ping_expecting_response_gets_a_pong_with_same_payload() {
        let header = HeaderBuilder::new("ping", did("did:example:alice"))
            .destination(did("did:example:node"))
            .expect_response(true)
            .build()
            .unwrap();
        let mut ctx = context(HstpMessage::new(header, Payload::from_bytes("hello")));
        let reply = PingHandler.handle(&mut ctx).await.unwrap().unwrap();
        assert_eq!(reply.header.status, Some(StatusCode::ok()));
        assert_eq!(reply.header.destination, Some(did("did:example:alice")));
        let mut payload = reply.payload;
        assert_eq!(payload.consume_to_bytes().unwrap(), "hello");
    }

    #[tokio::test]
    async fn ping_without_expected_response_yields_no_reply() {
        let header = HeaderBuilder::new("ping", did("did:example:alice"))
            .channel(did("did:example:room"))
            .build()
            .unwrap();
        let mut ctx = context(HstpMessage::new(header, Payload::empty()));
        assert!(PingHandler.handle(&mut ctx).await.unwrap().is_none());
    }

    #[test]
    fn round_trip_time_is_none_on_clock_skew() {
        let now = SystemTime::now();
        let earlier = now - Duration::from_secs(1);
        assert!(round_trip_time(now, earlier).is_none());
        assert!(round_trip_time(earlier, now).is_some());
    }
}
