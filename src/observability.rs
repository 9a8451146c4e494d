//! Tracing bootstrap and structured dispatch/activity logging fields (spec
//! §9's ambient "Structured logging on every dispatch path"), grounded on
//! the base crate's `span!(Level::INFO, ...)` + `tracing::info!` usage in
//! its message router.

use crate::config::LoggingConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Errors initializing the global tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),

    #[error("tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// Installs the process-wide [`tracing`] subscriber from a node's
/// [`LoggingConfig`]: an `EnvFilter` seeded from `logging.level` (further
/// overridable via `RUST_LOG`), JSON-formatted events when `console` is
/// false (suited to log aggregation), human-readable when true.
///
/// # Errors
/// Returns [`ObservabilityError::InvalidLevel`] if `logging.level` is not a
/// valid tracing level, or [`ObservabilityError::AlreadyInitialized`] if a
/// global subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), ObservabilityError> {
    let level: Level = logging
        .level
        .parse()
        .map_err(|_| ObservabilityError::InvalidLevel(logging.level.clone()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let result = if logging.console {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    };
    result.map_err(|_| ObservabilityError::AlreadyInitialized)
}

/// Fields attached to every dispatch-path log line (spec §9): the
/// operation name, the message id, an optional activity id, and how long
/// handling took.
#[derive(Debug, Clone)]
pub struct DispatchLogFields {
    pub operation: String,
    pub message_id: crate::domain_types::MessageId,
    pub activity_id: Option<crate::domain_types::ActivityId>,
    pub duration: std::time::Duration,
}

impl DispatchLogFields {
    /// Emits this dispatch as a single structured `tracing::info!` event.
    pub fn emit(&self) {
        tracing::info!(
            operation = %self.operation,
            message_id = %self.message_id,
            activity_id = self.activity_id.as_ref().map(ToString::to_string),
            duration_ms = self.duration.as_millis() as u64,
            "dispatched HSTP operation"
        );
    }
}
