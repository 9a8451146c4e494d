//! Black-box scenarios over the wired [`Node`]: direct ping/pong,
//! channel broadcast, and unknown-operation handling.

mod common;

use async_trait::async_trait;
use common::{did, ChannelBinding, ChannelHub, DirectLoopback};
use hstp_node::builtin_ops::is_pong_response;
use hstp_node::config::NodeConfig;
use hstp_node::context::MessageContext;
use hstp_node::domain_types::{ResponseTimeoutMs, StatusCode};
use hstp_node::engine::EngineError;
use hstp_node::message::{HeaderBuilder, HstpMessage, Payload};
use hstp_node::node::NodeBuilder;
use hstp_node::operation::{HandlerError, OperationHandler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct CountingPing(Arc<AtomicUsize>);

#[async_trait]
impl OperationHandler for CountingPing {
    fn operation(&self) -> &str {
        "ping"
    }

    async fn handle(&self, _ctx: &mut MessageContext) -> Result<Option<HstpMessage>, HandlerError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn s1_direct_ping_pong_round_trip() {
    let alice_did = did("did:example:alice");
    let bob_did = did("did:example:bob");

    let alice_binding = DirectLoopback::new("alice-loopback");
    let bob_binding = DirectLoopback::new("bob-loopback");
    DirectLoopback::pair(&alice_binding, &bob_binding);

    let alice = NodeBuilder::new(NodeConfig::development(alice_did.clone()))
        .with_binding(alice_binding)
        .build();
    let bob = NodeBuilder::new(NodeConfig::development(bob_did.clone()))
        .with_binding(bob_binding)
        .build();
    alice.start().await.unwrap();
    bob.start().await.unwrap();

    let header = HeaderBuilder::new("ping", alice_did.clone())
        .destination(bob_did.clone())
        .expect_response(true)
        .build()
        .unwrap();
    let original_id = header.id;
    let message = HstpMessage::new(header, Payload::from_bytes("hello"));

    let mut reply = alice
        .engine()
        .send_and_await_reply(message, ResponseTimeoutMs::default())
        .await
        .expect("bob replies with a pong");

    assert!(is_pong_response(original_id, &reply));
    assert_eq!(reply.header.status, Some(StatusCode::ok()));
    assert_eq!(reply.payload.consume_to_bytes().unwrap(), "hello");

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn s2_channel_ping_broadcast_invokes_each_subscriber_exactly_once() {
    let channel = did("did:example:c1");
    let hub = ChannelHub::new();

    let sender_binding = ChannelBinding::new("sender", &hub);
    let sub1_binding = ChannelBinding::new("sub1", &hub);
    let sub2_binding = ChannelBinding::new("sub2", &hub);

    let sub1_hits = Arc::new(AtomicUsize::new(0));
    let sub2_hits = Arc::new(AtomicUsize::new(0));

    let sender = NodeBuilder::new(NodeConfig::development(did("did:example:sender")))
        .with_binding(sender_binding)
        .build();
    let sub1 = NodeBuilder::new(NodeConfig::development(did("did:example:sub1")))
        .with_binding(sub1_binding)
        .with_operation(Arc::new(CountingPing(Arc::clone(&sub1_hits))))
        .build();
    let sub2 = NodeBuilder::new(NodeConfig::development(did("did:example:sub2")))
        .with_binding(sub2_binding)
        .with_operation(Arc::new(CountingPing(Arc::clone(&sub2_hits))))
        .build();

    sender.start().await.unwrap();
    sub1.start().await.unwrap();
    sub2.start().await.unwrap();

    sub1.transport().subscribe(&channel).await;
    sub2.transport().subscribe(&channel).await;

    let header = HeaderBuilder::new("ping", did("did:example:sender"))
        .channel(channel.clone())
        .expect_response(false)
        .build()
        .unwrap();
    let message = HstpMessage::new(header, Payload::empty());
    sender.engine().send(message).await.expect("channel publish reaches both subscribers");

    // handle_inbound is dispatched onto its own task per delivery; give both
    // subscriber engines a beat to run before asserting on the counters.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(sub1_hits.load(Ordering::SeqCst), 1);
    assert_eq!(sub2_hits.load(Ordering::SeqCst), 1);

    sender.shutdown().await;
    sub1.shutdown().await;
    sub2.shutdown().await;
}

#[tokio::test]
async fn s3_unknown_operation_yields_501_with_matching_correlation() {
    let alice_did = did("did:example:alice");
    let bob_did = did("did:example:bob");

    let alice_binding = DirectLoopback::new("alice-loopback");
    let bob_binding = DirectLoopback::new("bob-loopback");
    DirectLoopback::pair(&alice_binding, &bob_binding);

    let alice = NodeBuilder::new(NodeConfig::development(alice_did.clone()))
        .with_binding(alice_binding)
        .build();
    let bob = NodeBuilder::new(NodeConfig::development(bob_did.clone())).with_binding(bob_binding).build();
    alice.start().await.unwrap();
    bob.start().await.unwrap();

    let header = HeaderBuilder::new("nope", alice_did.clone())
        .destination(bob_did)
        .expect_response(true)
        .build()
        .unwrap();
    let original_id = header.id;
    let message = HstpMessage::new(header, Payload::empty());

    let reply = alice
        .engine()
        .send_and_await_reply(message, ResponseTimeoutMs::default())
        .await
        .expect("bob replies 501 for an unregistered operation");

    assert_eq!(reply.header.status, Some(StatusCode::not_implemented()));
    assert_eq!(reply.header.in_reply_to, Some(original_id));

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn sending_without_a_capable_binding_is_a_routing_error() {
    let node = NodeBuilder::new(NodeConfig::development(did("did:example:solo"))).build();
    let err = node.engine().ping(did("did:example:nobody"), ResponseTimeoutMs::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Routing(_)));
}
