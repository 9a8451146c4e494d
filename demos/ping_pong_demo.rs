//! Demonstrates a direct `ping`/`pong` round trip between two in-process
//! HSTP nodes, wired together by a minimal in-memory transport binding
//! instead of a real wire transport.

use async_trait::async_trait;
use hstp_node::config::NodeConfig;
use hstp_node::did::Did;
use hstp_node::domain_types::ResponseTimeoutMs;
use hstp_node::message::HstpMessage;
use hstp_node::node::NodeBuilder;
use hstp_node::transport::{ReceiveHandler, TransportBinding, TransportError};
use std::sync::{Arc, Mutex};

/// A transport binding that hands every outbound send straight to a peer
/// binding's receive callback, synchronously, in-process.
struct LoopbackBinding {
    name: String,
    peer: Mutex<Option<Arc<LoopbackBinding>>>,
    on_receive: Mutex<Vec<ReceiveHandler>>,
}

impl LoopbackBinding {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            peer: Mutex::new(None),
            on_receive: Mutex::new(Vec::new()),
        })
    }

    fn pair(a: &Arc<Self>, b: &Arc<Self>) {
        *a.peer.lock().unwrap() = Some(Arc::clone(b));
        *b.peer.lock().unwrap() = Some(Arc::clone(a));
    }
}

#[async_trait]
impl TransportBinding for LoopbackBinding {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&self, message: HstpMessage) -> Result<(), TransportError> {
        let peer = self.peer.lock().unwrap().clone().ok_or(TransportError::NoRoute)?;
        let handler = peer
            .on_receive
            .lock()
            .unwrap()
            .first()
            .cloned()
            .ok_or(TransportError::NoRoute)?;
        handler(message);
        Ok(())
    }

    fn on_receive(&self, handler: ReceiveHandler) {
        self.on_receive.lock().unwrap().push(handler);
    }

    fn supports_point_to_point(&self) -> bool {
        true
    }

    fn supports_pub_sub(&self) -> bool {
        false
    }

    async fn subscribe(&self, _channel: &Did) -> Result<(), TransportError> {
        Err(TransportError::Protocol("pub/sub unsupported".to_string()))
    }

    async fn unsubscribe(&self, _channel: &Did) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_subscribed(&self, _channel: &Did) -> bool {
        false
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let alice_did: Did = "did:example:alice".parse()?;
    let bob_did: Did = "did:example:bob".parse()?;

    let alice_binding = LoopbackBinding::new("alice-loopback");
    let bob_binding = LoopbackBinding::new("bob-loopback");
    LoopbackBinding::pair(&alice_binding, &bob_binding);

    let alice = NodeBuilder::new(NodeConfig::development(alice_did.clone()))
        .with_binding(alice_binding)
        .build();
    let bob = NodeBuilder::new(NodeConfig::development(bob_did.clone()))
        .with_binding(bob_binding)
        .build();

    alice.start().await?;
    bob.start().await?;

    println!("alice pinging bob...");
    let reply = alice.engine().ping(bob_did, ResponseTimeoutMs::default()).await?;
    println!("received reply status {}", reply.header.status.unwrap());

    alice.shutdown().await;
    bob.shutdown().await;
    Ok(())
}
