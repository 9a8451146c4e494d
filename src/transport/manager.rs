//! Transport Manager (spec §4.5, component E): fan-in inbound, fan-out
//! outbound, subscription broadcast, and cross-transport inbound
//! de-duplication.

use crate::did::Did;
use crate::message::HstpMessage;
use crate::transport::binding::{ReceiveHandler, TransportBinding, TransportError};
use crate::transport::dedup::DedupCache;
use crate::domain_types::DedupCacheSize;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by the [`TransportManager`] itself, as opposed to an
/// individual binding's [`TransportError`].
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Neither `destination` nor `channel` was set — spec §7's
    /// `InvalidMessage` kind.
    #[error("message has neither destination nor channel")]
    NoTarget,
    /// No binding in the effective set supports the message's shape.
    #[error("no binding supports {0}")]
    NoCapableBinding(&'static str),
}

/// Per-send outcome for one binding, surfaced to callers that want
/// fan-out detail (e.g. the management API); [`TransportManager::send`]
/// itself only fails if *no* capable binding exists at all.
pub struct SendOutcome {
    /// The binding's name.
    pub binding: String,
    /// `Ok(())` or the binding's reported error.
    pub result: Result<(), TransportError>,
}

/// Owns the effective set of [`TransportBinding`]s and fans inbound
/// messages in, outbound messages out.
pub struct TransportManager {
    bindings: DashMap<String, Arc<dyn TransportBinding>>,
    dedup: Arc<DedupCache>,
}

impl TransportManager {
    /// Creates a manager with an explicit binding set.
    #[must_use]
    pub fn new(bindings: Vec<Arc<dyn TransportBinding>>, dedup_capacity: DedupCacheSize) -> Self {
        let map = DashMap::new();
        for binding in bindings {
            map.insert(binding.name().to_string(), binding);
        }
        Self {
            bindings: map,
            dedup: Arc::new(DedupCache::new(dedup_capacity)),
        }
    }

    /// Starts every binding, then installs `on_inbound` on each so arrivals
    /// fan in to a single callback. The de-dup check (spec §8 property 4)
    /// happens here, before `on_inbound` is invoked, so callers never see
    /// a repeated delivery for the same `header.id` within the LRU window.
    ///
    /// # Errors
    /// Returns the first [`TransportError`] any binding's `start` reports.
    pub async fn start(&self, on_inbound: ReceiveHandler) -> Result<(), TransportError> {
        for entry in &self.bindings {
            entry.value().start().await?;
        }
        let dedup = Arc::clone(&self.dedup);
        for entry in &self.bindings {
            let binding_name = entry.key().clone();
            let on_inbound = Arc::clone(&on_inbound);
            let dedup = Arc::clone(&dedup);
            entry.value().on_receive(Arc::new(move |message: HstpMessage| {
                if dedup.record_and_check_duplicate(message.header.id) {
                    debug!(binding = %binding_name, message_id = %message.header.id, "dropping duplicate inbound message");
                    return;
                }
                on_inbound(message);
            }));
        }
        info!(bindings = self.bindings.len(), "transport manager started");
        Ok(())
    }

    /// Stops every binding.
    ///
    /// # Errors
    /// Returns the first [`TransportError`] any binding's `stop` reports,
    /// after attempting to stop all of them.
    pub async fn stop(&self) -> Result<(), TransportError> {
        let mut first_error = None;
        for entry in &self.bindings {
            if let Err(e) = entry.value().stop().await {
                warn!(binding = %entry.key(), error = %e, "error stopping transport binding");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Routes `message` per spec §4.5: direct messages go to every
    /// point-to-point-capable binding, channel messages to every
    /// pub/sub-capable binding. A naïve broadcast-to-capable is the
    /// specified baseline — no attempt is made to track which binding
    /// "knows" a given destination.
    ///
    /// # Errors
    /// Returns [`RoutingError::NoTarget`] if neither `destination` nor
    /// `channel` is set, or [`RoutingError::NoCapableBinding`] if no
    /// binding in the effective set can carry the message's shape.
    pub async fn send(&self, message: HstpMessage) -> Result<Vec<SendOutcome>, RoutingError> {
        let is_direct = message.header.destination.is_some();
        let is_channel = message.header.channel.is_some();
        match (is_direct, is_channel) {
            (false, false) => return Err(RoutingError::NoTarget),
            _ => {}
        }

        let capable: Vec<Arc<dyn TransportBinding>> = self
            .bindings
            .iter()
            .filter(|entry| {
                if is_direct {
                    entry.value().supports_point_to_point()
                } else {
                    entry.value().supports_pub_sub()
                }
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        if capable.is_empty() {
            return Err(RoutingError::NoCapableBinding(if is_direct {
                "point-to-point delivery"
            } else {
                "pub/sub delivery"
            }));
        }

        // HstpMessage's payload is single-consumption; fanning the same
        // logical send out to N bindings means each binding gets its own
        // clone of the header and an independent payload view built from
        // the same bytes, not the original `message` reused N times.
        let header = message.header;
        let bytes = {
            let mut payload = message.payload;
            payload.consume_to_bytes().unwrap_or_default()
        };

        let sends = capable.into_iter().map(|binding| {
            let header = header.clone();
            let bytes = bytes.clone();
            async move {
                let per_binding = HstpMessage::new(header, crate::message::Payload::from_bytes(bytes));
                let result = binding.send(per_binding).await;
                SendOutcome {
                    binding: binding.name().to_string(),
                    result,
                }
            }
        });

        Ok(join_all(sends).await)
    }

    /// Subscribes every pub/sub-capable binding to `channel`.
    pub async fn subscribe(&self, channel: &Did) {
        let capable: Vec<Arc<dyn TransportBinding>> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().supports_pub_sub())
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for binding in capable {
            if let Err(e) = binding.subscribe(channel).await {
                warn!(binding = binding.name(), channel = %channel, error = %e, "subscribe failed");
            }
        }
    }

    /// Unsubscribes every pub/sub-capable binding from `channel`.
    pub async fn unsubscribe(&self, channel: &Did) {
        let capable: Vec<Arc<dyn TransportBinding>> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().supports_pub_sub())
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for binding in capable {
            if let Err(e) = binding.unsubscribe(channel).await {
                warn!(binding = binding.name(), channel = %channel, error = %e, "unsubscribe failed");
            }
        }
    }

    /// The effective binding set's names, for the management surface.
    #[must_use]
    pub fn binding_names(&self) -> Vec<String> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::Did;
    use crate::message::{HeaderBuilder, Payload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    fn did(s: &str) -> Did {
        s.parse().unwrap()
    }

    struct FakeBinding {
        name: String,
        point_to_point: bool,
        pub_sub: bool,
        subscriptions: StdMutex<Vec<Did>>,
        sent: StdMutex<Vec<HstpMessage>>,
        started: AtomicBool,
    }

    impl FakeBinding {
        fn new(name: &str, point_to_point: bool, pub_sub: bool) -> Self {
            Self {
                name: name.to_string(),
                point_to_point,
                pub_sub,
                subscriptions: StdMutex::new(Vec::new()),
                sent: StdMutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl TransportBinding for FakeBinding {
        fn name(&self) -> &str {
            &self.name
        }
        async fn start(&self) -> Result<(), TransportError> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn stop(&self) -> Result<(), TransportError> {
            Ok(())
        }
        async fn send(&self, message: HstpMessage) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
        fn on_receive(&self, _handler: ReceiveHandler) {}
        fn supports_point_to_point(&self) -> bool {
            self.point_to_point
        }
        fn supports_pub_sub(&self) -> bool {
            self.pub_sub
        }
        async fn subscribe(&self, channel: &Did) -> Result<(), TransportError> {
            let mut subs = self.subscriptions.lock().unwrap();
            if !subs.contains(channel) {
                subs.push(channel.clone());
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

    #[tokio::test]
    async fn send_without_target_is_invalid() {
        let manager = TransportManager::new(vec![], DedupCacheSize::default());
        let header = HeaderBuilder::new("ping", did("did:example:alice"))
            .destination(did("did:example:bob"))
            .build()
            .unwrap();
        // Forge a header with neither target to exercise the routing check.
        let mut broken = header.clone();
        broken.destination = None;
        broken.channel = None;
        let message = HstpMessage::new(broken, Payload::empty());
        let err = manager.send(message).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoTarget));
    }

    #[tokio::test]
    async fn direct_send_goes_to_point_to_point_bindings_only() {
        let direct = Arc::new(FakeBinding::new("direct", true, false));
        let pubsub = Arc::new(FakeBinding::new("pubsub", false, true));
        let manager = TransportManager::new(
            vec![direct.clone(), pubsub.clone()],
            DedupCacheSize::default(),
        );
        let header = HeaderBuilder::new("ping", did("did:example:alice"))
            .destination(did("did:example:bob"))
            .build()
            .unwrap();
        let message = HstpMessage::new(header, Payload::from_bytes("hi"));
        let outcomes = manager.send(message).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].binding, "direct");
        assert_eq!(direct.sent.lock().unwrap().len(), 1);
        assert_eq!(pubsub.sent.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn subscribe_covers_every_pub_sub_binding() {
        let a = Arc::new(FakeBinding::new("a", false, true));
        let b = Arc::new(FakeBinding::new("b", false, true));
        let direct_only = Arc::new(FakeBinding::new("direct", true, false));
        let manager = TransportManager::new(
            vec![a.clone(), b.clone(), direct_only.clone()],
            DedupCacheSize::default(),
        );
        let channel = did("did:example:c1");
        manager.subscribe(&channel).await;
        assert!(a.is_subscribed(&channel));
        assert!(b.is_subscribed(&channel));
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_restores_initial_state() {
        let a = Arc::new(FakeBinding::new("a", false, true));
        let manager = TransportManager::new(vec![a.clone()], DedupCacheSize::default());
        let channel = did("did:example:c1");
        manager.subscribe(&channel).await;
        assert!(a.is_subscribed(&channel));
        manager.unsubscribe(&channel).await;
        assert!(!a.is_subscribed(&channel));
    }

    #[tokio::test]
    async fn no_capable_binding_is_an_error() {
        let pubsub_only = Arc::new(FakeBinding::new("pubsub", false, true));
        let manager = TransportManager::new(vec![pubsub_only], DedupCacheSize::default());
        let header = HeaderBuilder::new("ping", did("did:example:alice"))
            .destination(did("did:example:bob"))
            .build()
            .unwrap();
        let message = HstpMessage::new(header, Payload::empty());
        let err = manager.send(message).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoCapableBinding(_)));
    }
}
