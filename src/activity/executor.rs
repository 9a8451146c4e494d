//! The `ActivityExecutor` contract and the event stream it emits (spec
//! §4.8).

use crate::activity::model::Activity;
use crate::activity::schema::ActivitySchema;
use crate::domain_types::{ActivityId, Progress};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

/// A tagged union of the events an [`ActivityExecutor`] emits while
/// driving one activity to completion (spec §4.8).
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Started,
    Progress {
        progress: Progress,
        message: Option<String>,
    },
    Output(BTreeMap<String, Value>),
    Completed {
        output: Option<BTreeMap<String, Value>>,
        duration_ms: Option<u64>,
    },
    Failed {
        code: String,
        message: String,
        detail: Option<Value>,
        /// Set by the executor to signal this failure is worth retrying
        /// per the schema's [`crate::activity::schema::RetryConfig`].
        retryable: bool,
    },
    Cancelled {
        reason: Option<String>,
    },
    Paused {
        reason: Option<String>,
    },
    Resumed,
    SubActivityCreated {
        parent_id: ActivityId,
        child_id: ActivityId,
        child_schema_id: crate::domain_types::SchemaId,
    },
}

/// A single emitted event, timestamped and tied to an activity (spec
/// §4.8: "Events carry the activity id and a timestamp").
#[derive(Debug, Clone)]
pub struct TimestampedEvent {
    pub activity_id: ActivityId,
    pub at: SystemTime,
    pub event: ExecutionEvent,
}

/// Context handed to an executor for one execution attempt: the
/// cancellation token it must observe at every suspension point (spec
/// §5), a pause signal it may observe to cooperatively suspend work, and
/// the caller identity/correlation id for any sub-activity it creates.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub cancellation: CancellationToken,
    /// `true` while [`crate::activity::manager::ActivityManager::pause_activity`]
    /// has been called and not yet resumed. Observing this is optional —
    /// an executor that ignores it simply runs to completion or
    /// cancellation as if pause were a no-op.
    pub paused: tokio::sync::watch::Receiver<bool>,
    pub created_by: String,
    pub correlation_id: Option<crate::domain_types::CorrelationId>,
}

/// Executes activities of one or more registered schemas.
///
/// Implementations are discovered via an explicit registration table (spec
/// §9) rather than reflection — a deployment constructs its executors and
/// hands them to [`crate::activity::manager::ActivityManager::register_executor`].
#[async_trait]
pub trait ActivityExecutor: Send + Sync {
    /// This executor's plugin id, matched against
    /// [`ActivitySchema::executor_plugin_id`].
    fn plugin_id(&self) -> &crate::domain_types::ExecutorPluginId;

    /// Drives `activity` to completion, emitting a sequential stream of
    /// [`ExecutionEvent`]s that the manager consumes in order and applies
    /// to its own copy of the activity (spec §4.8's execution protocol).
    async fn execute(
        &self,
        activity: &Activity,
        schema: &ActivitySchema,
        context: ExecutionContext,
    ) -> BoxStream<'static, ExecutionEvent>;

    /// Called once when the manager shuts down, after every in-flight
    /// execution has been cancelled and given its grace period.
    async fn shutdown(&self) {}
}
