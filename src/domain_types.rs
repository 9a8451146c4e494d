//! Strongly-typed domain primitives shared across the node.
//!
//! Every bounded or validated scalar that flows between components is a
//! [`nutype`]-wrapped newtype rather than a bare `u64`/`String`, so that an
//! out-of-range value is rejected at construction instead of surfacing as a
//! puzzling failure three calls later.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Globally unique identifier for an [`crate::message::HstpMessage`].
///
/// Generated with a 128-bit random UUID per spec §4.2's collision-resistance
/// requirement.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Into
))]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message id.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }
}

/// Identifier for an [`crate::activity::model::Activity`] instance.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Into
))]
pub struct ActivityId(Uuid);

impl ActivityId {
    /// Creates a new random activity id.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }
}

/// Identifier for an [`crate::activity::schema::ActivitySchema`].
#[nutype(
    validate(len_char_min = 1, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct SchemaId(String);

/// A caller-supplied correlation id threaded through `StartActivity` calls.
#[nutype(
    validate(len_char_min = 1, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct CorrelationId(String);

/// Identifier of a registered `ActivityExecutor` plugin.
#[nutype(
    validate(len_char_min = 1, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct ExecutorPluginId(String);

/// Media type of a message payload. Defaults per spec §3 to
/// `application/octet-stream`.
#[nutype(
    sanitize(trim),
    validate(len_char_min = 1, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    ),
    default = "application/octet-stream"
)]
pub struct MediaType(String);

/// Three-digit, HTTP-like reply status code.
#[nutype(
    validate(greater_or_equal = 100, less_or_equal = 599),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct StatusCode(u16);

impl StatusCode {
    /// `200 OK` — the default status for a successful reply.
    #[must_use]
    pub fn ok() -> Self {
        Self::try_new(200).expect("200 is a valid status code")
    }

    /// `501 Not Implemented` — used for `UnknownOperation` replies.
    #[must_use]
    pub fn not_implemented() -> Self {
        Self::try_new(501).expect("501 is a valid status code")
    }

    /// `500 Internal Server Error` — used for `HandlerError` replies.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::try_new(500).expect("500 is a valid status code")
    }
}

/// How long an outbound `expectResponse=true` send waits for a correlated
/// reply before timing out. Defaults to 30 s per spec §5.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 600_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 30_000
)]
pub struct ResponseTimeoutMs(u64);

impl ResponseTimeoutMs {
    /// Converts to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.into_inner())
    }
}

/// Per-send timeout enforced by a transport binding.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 600_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 10_000
)]
pub struct SendTimeoutMs(u64);

impl SendTimeoutMs {
    /// Converts to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.into_inner())
    }
}

/// Capacity of the engine's inbound de-duplication LRU. Default 8192 per
/// spec §4.5.
#[nutype(
    validate(greater_or_equal = 16, less_or_equal = 10_000_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 8192
)]
pub struct DedupCacheSize(usize);

impl DedupCacheSize {
    /// Gets the value as `usize`.
    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.into_inner()
    }
}

/// Maximum number of activities the manager will run concurrently before
/// backpressuring `StartActivity`.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 100_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 64
)]
pub struct MaxConcurrentActivities(usize);

impl MaxConcurrentActivities {
    /// Gets the value as `usize`.
    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.into_inner()
    }
}

/// Maximum retry attempts for a retryable activity execution failure.
#[nutype(
    validate(greater_or_equal = 0, less_or_equal = 20),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 3
)]
pub struct MaxRetries(u8);

impl MaxRetries {
    /// Gets the value as `u8`.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.into_inner()
    }
}

/// Exponential backoff multiplier applied between retry attempts.
#[nutype(
    validate(greater_or_equal = 1.0, less_or_equal = 10.0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 2.0
)]
pub struct RetryBackoffMultiplier(f64);

impl RetryBackoffMultiplier {
    /// Gets the value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.into_inner()
    }
}

/// Base delay before the first retry attempt.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 600_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 500
)]
pub struct RetryBaseDelayMs(u64);

impl RetryBaseDelayMs {
    /// Converts to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.into_inner())
    }
}

/// Activity completion fraction, clamped to `[0.0, 1.0]`.
#[nutype(
    sanitize(with = |v: f64| v.clamp(0.0, 1.0)),
    validate(greater_or_equal = 0.0, less_or_equal = 1.0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 0.0
)]
pub struct Progress(f64);

impl Progress {
    /// Gets the value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.into_inner()
    }
}

/// Graceful-shutdown grace period for transports and activity cancellation.
#[nutype(
    validate(greater_or_equal = 0, less_or_equal = 600_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 5_000
)]
pub struct GracePeriodMs(u64);

impl GracePeriodMs {
    /// Converts to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.into_inner())
    }
}

/// Worker thread count for the node's shared tokio runtime (spec §5's
/// "shared thread pool" concurrency model).
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 32),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 4
)]
pub struct WorkerThreadCount(usize);

impl WorkerThreadCount {
    /// Gets the value as `usize`.
    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.into_inner()
    }
}

/// MQTT-style quality of service level.
#[nutype(
    validate(less_or_equal = 2),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 0
)]
pub struct QosLevel(u8);
