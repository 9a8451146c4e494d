//! Top-level error aggregation.
//!
//! Each subsystem defines its own `thiserror` enum close to where the
//! errors are raised (`transport::TransportError`, `activity::ActivityError`,
//! …), matching spec §7's per-kind taxonomy. `NodeError` is the aggregate the
//! lifecycle-binding layer (§4's component K) surfaces at the process
//! boundary — fatal configuration failures exit the process with code 1;
//! everything else is logged and handled locally by the subsystem that
//! raised it.

use crate::activity::ActivityError;
use crate::config::ConfigError;
use crate::transport::manager::RoutingError;
use thiserror::Error;

/// Aggregate error surfaced by the lifecycle-binding layer.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid YAML, missing required option, or a config builder rejection.
    /// Fatal at startup per spec §7.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A message could not be routed (missing/duplicate target, no capable
    /// binding).
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    /// An activity-manager-level failure (schema registration, validation).
    #[error("activity error: {0}")]
    Activity(#[from] ActivityError),

    /// Catch-all for startup failures from external collaborators (DID
    /// resolver wiring, transport provider discovery) that don't have a
    /// dedicated variant.
    #[error("startup error: {0}")]
    Startup(#[from] anyhow::Error),
}
