//! The HSTP message shape: header, payload, and the invariants spec §3
//! places on them.

use crate::did::Did;
use crate::domain_types::{MediaType, MessageId, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;

/// Immutable-once-sent HSTP message header.
///
/// `destination` and `channel` are mutually exclusive and at least one is
/// set on outbound messages (spec §3's invariant); this is enforced by
/// [`HeaderBuilder::build`] rather than by the type itself, because inbound
/// deliveries are taken as given and must still be representable even if a
/// misbehaving peer violates the rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HstpHeader {
    /// Globally unique id, generated at construction.
    pub id: MessageId,
    /// Non-empty operation name, e.g. `"ping"`.
    pub operation: String,
    /// The sender's DID.
    pub source: Did,
    /// Point-to-point destination, mutually exclusive with `channel`.
    pub destination: Option<Did>,
    /// Pub/sub channel, mutually exclusive with `destination`.
    pub channel: Option<Did>,
    /// The id of the message this one replies to, if any.
    pub in_reply_to: Option<MessageId>,
    /// Present only on replies.
    pub status: Option<StatusCode>,
    /// Defaults to `application/octet-stream`.
    pub media_type: MediaType,
    /// UTC, millisecond-precision wall clock instant.
    pub timestamp: SystemTime,
    /// When `true` on a direct message, the sender awaits a correlated reply.
    pub expect_response: bool,
}

/// Errors raised while constructing or validating an [`HstpHeader`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidHeader {
    /// `operation` was empty.
    #[error("operation name must not be empty")]
    EmptyOperation,
    /// Neither `destination` nor `channel` was set on an outbound header.
    #[error("exactly one of destination or channel must be set, got neither")]
    NoTarget,
    /// Both `destination` and `channel` were set.
    #[error("exactly one of destination or channel must be set, got both")]
    BothTargets,
    /// A reply header (`in_reply_to` set) had no `status`.
    #[error("replies must carry a status")]
    ReplyWithoutStatus,
}

/// Builds an [`HstpHeader`], enforcing the outbound invariants of spec §3.
pub struct HeaderBuilder {
    operation: String,
    source: Did,
    destination: Option<Did>,
    channel: Option<Did>,
    in_reply_to: Option<MessageId>,
    status: Option<StatusCode>,
    media_type: MediaType,
    expect_response: bool,
}

impl HeaderBuilder {
    /// Starts building a header for `operation`, sent from `source`.
    #[must_use]
    pub fn new(operation: impl Into<String>, source: Did) -> Self {
        Self {
            operation: operation.into(),
            source,
            destination: None,
            channel: None,
            in_reply_to: None,
            status: None,
            media_type: MediaType::default(),
            expect_response: false,
        }
    }

    /// Sets a point-to-point destination.
    #[must_use]
    pub fn destination(mut self, destination: Did) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets a pub/sub channel.
    #[must_use]
    pub fn channel(mut self, channel: Did) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Marks this header as a reply to `id`, with the given status.
    #[must_use]
    pub fn in_reply_to(mut self, id: MessageId, status: StatusCode) -> Self {
        self.in_reply_to = Some(id);
        self.status = Some(status);
        self
    }

    /// Overrides the default media type.
    #[must_use]
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Requests a correlated reply for this (necessarily direct) message.
    #[must_use]
    pub fn expect_response(mut self, expect_response: bool) -> Self {
        self.expect_response = expect_response;
        self
    }

    /// Validates the invariants and produces the header.
    ///
    /// # Errors
    /// See [`InvalidHeader`].
    pub fn build(self) -> Result<HstpHeader, InvalidHeader> {
        if self.operation.is_empty() {
            return Err(InvalidHeader::EmptyOperation);
        }
        match (&self.destination, &self.channel) {
            (None, None) => return Err(InvalidHeader::NoTarget),
            (Some(_), Some(_)) => return Err(InvalidHeader::BothTargets),
            _ => {}
        }
        if self.in_reply_to.is_some() && self.status.is_none() {
            return Err(InvalidHeader::ReplyWithoutStatus);
        }
        Ok(HstpHeader {
            id: MessageId::generate(),
            operation: self.operation,
            source: self.source,
            destination: self.destination,
            channel: self.channel,
            in_reply_to: self.in_reply_to,
            status: self.status,
            media_type: self.media_type,
            timestamp: SystemTime::now(),
            expect_response: self.expect_response,
        })
    }
}

/// A single-consumer, finite sequence of byte chunks.
///
/// Payloads are consumed exactly once (spec §3, §8 property 5): a second
/// call to [`Payload::consume`] returns [`PayloadAlreadyConsumed`]
/// deterministically rather than yielding an empty or partial result.
/// Retry logic that needs to resend a payload must reconstruct it from the
/// original source, not replay a consumed `Payload`.
pub struct Payload {
    chunks: Option<Vec<Bytes>>,
}

/// Returned by [`Payload::consume`] when the payload was already read.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("payload already consumed")]
pub struct PayloadAlreadyConsumed;

impl Payload {
    /// An empty payload — valid per spec §3 ("payload MAY be empty").
    #[must_use]
    pub fn empty() -> Self {
        Self { chunks: Some(Vec::new()) }
    }

    /// Wraps a single in-memory chunk.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            chunks: Some(vec![bytes.into()]),
        }
    }

    /// Wraps a finite sequence of chunks, preserving order.
    #[must_use]
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        Self { chunks: Some(chunks) }
    }

    /// Whether this payload has already been consumed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.chunks.is_none()
    }

    /// Consumes the payload, returning its chunks in order.
    ///
    /// # Errors
    /// Returns [`PayloadAlreadyConsumed`] if this payload was already read.
    pub fn consume(&mut self) -> Result<Vec<Bytes>, PayloadAlreadyConsumed> {
        self.chunks.take().ok_or(PayloadAlreadyConsumed)
    }

    /// Convenience: consumes the payload and concatenates its chunks.
    ///
    /// # Errors
    /// Returns [`PayloadAlreadyConsumed`] if this payload was already read.
    pub fn consume_to_bytes(&mut self) -> Result<Bytes, PayloadAlreadyConsumed> {
        let chunks = self.consume()?;
        if chunks.len() == 1 {
            return Ok(chunks.into_iter().next().unwrap_or_default());
        }
        let mut buf = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buf))
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// An HSTP message: a header plus its single-consumption payload.
#[derive(Debug)]
pub struct HstpMessage {
    /// The message header.
    pub header: HstpHeader,
    /// The message payload.
    pub payload: Payload,
}

impl HstpMessage {
    /// Convenience constructor.
    #[must_use]
    pub fn new(header: HstpHeader, payload: Payload) -> Self {
        Self { header, payload }
    }

    /// Builds a reply header/message per spec §4.6 step 6: `inReplyTo` set,
    /// `source`/`destination` swapped relative to the original, `status`
    /// defaulted to 200, and `expectResponse=false`. `operation` names the
    /// reply's own operation (e.g. `"pong"` for a `ping`'s reply); generic
    /// replies with no operation-specific name of their own use `"reply"`.
    #[must_use]
    pub fn reply(&self, node_did: &Did, operation: impl Into<String>, status: StatusCode, payload: Payload) -> HstpMessage {
        let reply_source = self.header.destination.clone().unwrap_or_else(|| node_did.clone());
        let header = HstpHeader {
            id: MessageId::generate(),
            operation: operation.into(),
            source: reply_source,
            destination: Some(self.header.source.clone()),
            channel: None,
            in_reply_to: Some(self.header.id),
            status: Some(status),
            media_type: self.header.media_type.clone(),
            timestamp: SystemTime::now(),
            expect_response: false,
        };
        HstpMessage { header, payload }
    }
}
