//! Shared in-memory transport fixtures for black-box node tests:
//! [`DirectLoopback`] wires exactly two nodes point-to-point, [`ChannelHub`]
//! lets any number of nodes publish/subscribe to named channels. Neither
//! binding implements a real wire protocol — both hand messages straight
//! from one binding's `send` to another's installed receive callback,
//! in-process, mirroring the `FakeBinding`/`NullBinding` test fixtures
//! already used inside `transport/manager.rs`/`transport/provider.rs`.

use async_trait::async_trait;
use bytes::Bytes;
use hstp_node::did::Did;
use hstp_node::message::{HstpMessage, Payload};
use hstp_node::transport::{ReceiveHandler, TransportBinding, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[allow(dead_code)]
pub fn did(s: &str) -> Did {
    s.parse().expect("valid test DID")
}

/// A point-to-point-only binding paired one-to-one with a peer.
pub struct DirectLoopback {
    name: String,
    peer: Mutex<Option<Arc<DirectLoopback>>>,
    on_receive: Mutex<Vec<ReceiveHandler>>,
}

impl DirectLoopback {
    #[allow(dead_code)]
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            peer: Mutex::new(None),
            on_receive: Mutex::new(Vec::new()),
        })
    }

    #[allow(dead_code)]
    pub fn pair(a: &Arc<Self>, b: &Arc<Self>) {
        *a.peer.lock().unwrap() = Some(Arc::clone(b));
        *b.peer.lock().unwrap() = Some(Arc::clone(a));
    }
}

#[async_trait]
impl TransportBinding for DirectLoopback {
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
        let handler = peer.on_receive.lock().unwrap().first().cloned().ok_or(TransportError::NoRoute)?;
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

/// Shared broadcast hub behind every [`ChannelBinding`] subscribed to the
/// same channel set, so publishing from one binding reaches every other
/// subscriber's installed receive callback.
#[derive(Default)]
pub struct ChannelHub {
    subscribers: Mutex<HashMap<String, Vec<ReceiveHandler>>>,
}

impl ChannelHub {
    #[allow(dead_code)]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// A pub/sub-only binding backed by a [`ChannelHub`].
pub struct ChannelBinding {
    name: String,
    hub: Arc<ChannelHub>,
    handler: Mutex<Vec<ReceiveHandler>>,
    subscriptions: Mutex<Vec<Did>>,
}

impl ChannelBinding {
    #[allow(dead_code)]
    pub fn new(name: &str, hub: &Arc<ChannelHub>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            hub: Arc::clone(hub),
            handler: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TransportBinding for ChannelBinding {
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
        let channel = message.header.channel.clone().ok_or(TransportError::NoRoute)?;
        let token = channel.to_transport_safe_token();
        let header = message.header.clone();
        let mut payload = message.payload;
        let bytes: Bytes = payload.consume_to_bytes().unwrap_or_default();

        let recipients = self.hub.subscribers.lock().unwrap().get(&token).cloned().unwrap_or_default();
        for handler in recipients {
            let per_recipient = HstpMessage::new(header.clone(), Payload::from_bytes(bytes.clone()));
            handler(per_recipient);
        }
        Ok(())
    }

    fn on_receive(&self, handler: ReceiveHandler) {
        self.handler.lock().unwrap().push(handler);
    }

    fn supports_point_to_point(&self) -> bool {
        false
    }

    fn supports_pub_sub(&self) -> bool {
        true
    }

    async fn subscribe(&self, channel: &Did) -> Result<(), TransportError> {
        let mut subs = self.subscriptions.lock().unwrap();
        if !subs.contains(channel) {
            subs.push(channel.clone());
        }
        drop(subs);

        if let Some(handler) = self.handler.lock().unwrap().first().cloned() {
            self.hub
                .subscribers
                .lock()
                .unwrap()
                .entry(channel.to_transport_safe_token())
                .or_default()
                .push(handler);
        }
        Ok(())
    }

    async fn unsubscribe(&self, channel: &Did) -> Result<(), TransportError> {
        self.subscriptions.lock().unwrap().retain(|c| c != channel);
        Ok(())
    }

    fn is_subscribed(&self, channel: &Did) -> bool {
        self.subscriptions.lock().unwrap().contains(channel)
    }
}
