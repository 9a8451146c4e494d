//! The Activity Manager (spec §4.8 component J): a self-contained
//! scheduler that drives declarative `Activity` instances through their
//! lifecycle, backed by registered schemas and executors.

use crate::activity::executor::{ActivityExecutor, ExecutionContext, ExecutionEvent, TimestampedEvent};
use crate::activity::model::{Activity, ActivityFailure, ActivityStatus};
use crate::activity::schema::ActivitySchema;
use crate::activity::statistics::ActivityStatistics;
use crate::activity::validator::{ActivityValidator, ValidationContext, ValidationPhase, ValidationResult};
use crate::domain_types::{CorrelationId, ExecutorPluginId, GracePeriodMs, MaxConcurrentActivities, SchemaId};
use dashmap::DashMap;
use futures::stream::StreamExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors the Activity Manager raises for its own operations (spec §7's
/// `ValidationError`/`ExecutionError` rows, plus registry lookups).
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("no schema registered with id {0}")]
    SchemaNotFound(SchemaId),
    #[error("no executor registered with plugin id {0}")]
    ExecutorNotFound(ExecutorPluginId),
    #[error("no activity found with id {0}")]
    ActivityNotFound(crate::domain_types::ActivityId),
    #[error("validation failed with {} error(s)", .0.errors.len())]
    ValidationFailed(ValidationResult),
}

/// Filter for [`ActivityManager::search_activities`]. Every set field must
/// match; `None` fields are not filtered on.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub schema_id: Option<SchemaId>,
    pub status: Option<ActivityStatus>,
    pub created_by: Option<String>,
}

/// Opaque handle returned by [`ActivityManager::add_event_listener`], used
/// to later [`ActivityManager::remove_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(TimestampedEvent) + Send + Sync>;

struct ExecutionControl {
    cancellation: CancellationToken,
    pause_tx: watch::Sender<bool>,
}

/// Configuration the manager needs at construction; everything else
/// (schemas, executors, the validator) is registered afterward.
#[derive(Debug, Clone, Default)]
pub struct ActivityManagerConfig {
    pub max_concurrent_activities: MaxConcurrentActivities,
    pub grace_period: GracePeriodMs,
}

/// Drives activities through `CREATED → QUEUED → RUNNING →
/// {COMPLETED|FAILED|CANCELLED}` (with `RUNNING ↔ PAUSED`), per spec §4.8.
///
/// Most operations that mutate shared state take `self: &Arc<Self>` so the
/// manager can spawn its own execution tasks without a caller needing to
/// hand it a second handle — construct it once behind an `Arc` and every
/// `start_activity` call hands the spawned task its own clone.
pub struct ActivityManager {
    schemas: DashMap<SchemaId, ActivitySchema>,
    executors: DashMap<ExecutorPluginId, Arc<dyn ActivityExecutor>>,
    activities: DashMap<crate::domain_types::ActivityId, Activity>,
    controls: DashMap<crate::domain_types::ActivityId, ExecutionControl>,
    validator: Arc<dyn ActivityValidator>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
    concurrency: Arc<Semaphore>,
    config: ActivityManagerConfig,
}

impl ActivityManager {
    /// Builds an empty manager with the given validator and config.
    #[must_use]
    pub fn new(validator: Arc<dyn ActivityValidator>, config: ActivityManagerConfig) -> Self {
        let permits = config.max_concurrent_activities.as_usize();
        Self {
            schemas: DashMap::new(),
            executors: DashMap::new(),
            activities: DashMap::new(),
            controls: DashMap::new(),
            validator,
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            concurrency: Arc::new(Semaphore::new(permits)),
            config,
        }
    }

    /// Registers an executor, keyed by [`ActivityExecutor::plugin_id`].
    pub fn register_executor(&self, executor: Arc<dyn ActivityExecutor>) {
        self.executors.insert(executor.plugin_id().clone(), executor);
    }

    /// Validates `schema` and its referenced executor, then registers it.
    ///
    /// # Errors
    /// Returns [`ActivityError::ExecutorNotFound`] if `schema.executor_plugin_id`
    /// is not registered, or [`ActivityError::ValidationFailed`] if the
    /// schema itself fails validation.
    pub async fn register_schema(&self, schema: ActivitySchema) -> Result<(), ActivityError> {
        if !self.executors.contains_key(&schema.executor_plugin_id) {
            return Err(ActivityError::ExecutorNotFound(schema.executor_plugin_id.clone()));
        }
        let ctx = ValidationContext::new(ValidationPhase::Schema, "system");
        let result = self.validator.validate_schema(&schema, &ctx).await;
        if !result.is_valid {
            return Err(ActivityError::ValidationFailed(result));
        }
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    /// Removes a schema, notifying listeners of its removal via a log
    /// event — schema lifecycle is not itself an [`ExecutionEvent`], which
    /// is scoped to one activity.
    pub fn unregister_schema(&self, id: &SchemaId) -> bool {
        let removed = self.schemas.remove(id).is_some();
        if removed {
            info!(schema_id = %id, "schema unregistered");
        }
        removed
    }

    /// Validates `input` against the schema, then creates and queues an
    /// activity (spec §4.8). Blocks (backpressures) until a concurrency
    /// slot is available per `config.max_concurrent_activities` before the
    /// activity is created — the specified default policy (spec §4.8,
    /// §5's "Backpressure").
    ///
    /// # Errors
    /// Returns [`ActivityError::SchemaNotFound`] or
    /// [`ActivityError::ValidationFailed`] without creating an activity.
    ///
    /// # Panics
    /// Panics if the internal concurrency semaphore has been closed, which
    /// never happens while `self` is alive.
    pub async fn start_activity(
        self: &Arc<Self>,
        schema_id: SchemaId,
        input: BTreeMap<String, Value>,
        created_by: impl Into<String>,
        correlation_id: Option<CorrelationId>,
    ) -> Result<Activity, ActivityError> {
        let created_by = created_by.into();
        let schema = self
            .schemas
            .get(&schema_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ActivityError::SchemaNotFound(schema_id.clone()))?;

        let ctx = ValidationContext::new(ValidationPhase::Input, created_by.clone());
        let result = self.validator.validate_input(&schema, &input, &ctx).await;
        if !result.is_valid {
            return Err(ActivityError::ValidationFailed(result));
        }

        let permit = Arc::clone(&self.concurrency)
            .acquire_owned()
            .await
            .expect("concurrency semaphore is never closed while the manager is alive");

        let mut activity = Activity::new(schema_id, input, created_by.clone(), correlation_id.clone());
        activity.transition_to(ActivityStatus::Queued, None);
        let snapshot = activity.clone();
        let activity_id = snapshot.id;
        self.activities.insert(activity_id, activity);

        let cancellation = CancellationToken::new();
        let (pause_tx, pause_rx) = watch::channel(false);
        self.controls.insert(
            activity_id,
            ExecutionControl {
                cancellation: cancellation.clone(),
                pause_tx,
            },
        );

        let executor = self
            .executors
            .get(&schema.executor_plugin_id)
            .map(|entry| Arc::clone(entry.value()));

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager
                .run_execution(activity_id, schema, executor, cancellation, pause_rx, created_by, correlation_id, permit)
                .await;
        });

        Ok(snapshot)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_execution(
        self: Arc<Self>,
        activity_id: crate::domain_types::ActivityId,
        schema: ActivitySchema,
        executor: Option<Arc<dyn ActivityExecutor>>,
        cancellation: CancellationToken,
        pause_rx: watch::Receiver<bool>,
        created_by: String,
        correlation_id: Option<CorrelationId>,
        _permit: tokio::sync::OwnedSemaphorePermit,
    ) {
        let Some(executor) = executor else {
            self.apply_transition(activity_id, ActivityStatus::Running, None);
            self.fail(activity_id, "EXECUTOR_NOT_FOUND", format!("no executor registered for {}", schema.executor_plugin_id), None);
            self.controls.remove(&activity_id);
            return;
        };

        let deadline_guard = schema.constraints.max_execution_time_ms.map(|budget_ms| {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(budget_ms)).await;
                cancellation.cancel();
            })
        });

        let mut attempt: u32 = 0;
        loop {
            self.apply_transition(activity_id, ActivityStatus::Running, None);
            self.notify(activity_id, ExecutionEvent::Started);

            if cancellation.is_cancelled() {
                self.finish_cancelled(activity_id, None);
                break;
            }

            let Some(activity_snapshot) = self.activities.get(&activity_id).map(|e| e.value().clone()) else {
                break;
            };
            let exec_ctx = ExecutionContext {
                cancellation: cancellation.clone(),
                paused: pause_rx.clone(),
                created_by: created_by.clone(),
                correlation_id: correlation_id.clone(),
            };
            let mut stream = executor.execute(&activity_snapshot, &schema, exec_ctx).await;

            let mut pending_retry: Option<(bool, String, String, Option<Value>)> = None;
            let mut went_terminal = false;

            while let Some(event) = stream.next().await {
                if cancellation.is_cancelled() {
                    self.finish_cancelled(activity_id, None);
                    went_terminal = true;
                    break;
                }
                match &event {
                    // The manager already performed its own Running
                    // transition at the top of this loop; an executor's own
                    // Started event is still forwarded to listeners below.
                    ExecutionEvent::Started => {}
                    ExecutionEvent::Progress { progress, .. } => self.update_progress(activity_id, *progress),
                    ExecutionEvent::Output(map) => self.merge_output(activity_id, map.clone()),
                    ExecutionEvent::Completed { output, .. } => {
                        if let Some(out) = output {
                            self.set_output(activity_id, out.clone());
                        }
                        self.apply_transition(activity_id, ActivityStatus::Completed, None);
                        went_terminal = true;
                    }
                    ExecutionEvent::Failed {
                        code,
                        message,
                        detail,
                        retryable,
                    } => {
                        pending_retry = Some((*retryable, code.clone(), message.clone(), detail.clone()));
                    }
                    ExecutionEvent::Cancelled { reason } => {
                        self.finish_cancelled(activity_id, reason.clone());
                        went_terminal = true;
                    }
                    ExecutionEvent::Paused { reason } => {
                        self.apply_transition(activity_id, ActivityStatus::Paused, reason.clone());
                    }
                    ExecutionEvent::Resumed => {
                        self.apply_transition(activity_id, ActivityStatus::Running, None);
                    }
                    ExecutionEvent::SubActivityCreated { .. } => {}
                }
                self.notify(activity_id, event);
                if went_terminal {
                    break;
                }
            }

            if went_terminal {
                break;
            }

            if let Some((retryable, code, message, detail)) = pending_retry {
                if retryable {
                    if let Some(retry_config) = &schema.constraints.retry_config {
                        if attempt < u32::from(retry_config.max_retries.as_u8()) {
                            let delay = retry_config.delay_for_attempt(attempt);
                            attempt += 1;
                            warn!(%activity_id, attempt, ?delay, "retrying activity execution");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
                self.fail(activity_id, &code, message, detail);
            }
            break;
        }

        if let Some(guard) = deadline_guard {
            guard.abort();
        }
        self.controls.remove(&activity_id);
    }

    fn finish_cancelled(&self, activity_id: crate::domain_types::ActivityId, reason: Option<String>) {
        self.apply_transition(activity_id, ActivityStatus::Cancelled, reason);
    }

    fn apply_transition(&self, id: crate::domain_types::ActivityId, next: ActivityStatus, reason: Option<String>) -> bool {
        self.activities
            .get_mut(&id)
            .map(|mut entry| entry.transition_to(next, reason))
            .unwrap_or(false)
    }

    fn update_progress(&self, id: crate::domain_types::ActivityId, progress: crate::domain_types::Progress) {
        if let Some(mut entry) = self.activities.get_mut(&id) {
            entry.progress = progress;
        }
    }

    fn merge_output(&self, id: crate::domain_types::ActivityId, output: BTreeMap<String, Value>) {
        if let Some(mut entry) = self.activities.get_mut(&id) {
            entry.output.extend(output);
        }
    }

    fn set_output(&self, id: crate::domain_types::ActivityId, output: BTreeMap<String, Value>) {
        if let Some(mut entry) = self.activities.get_mut(&id) {
            entry.output = output;
        }
    }

    fn fail(&self, id: crate::domain_types::ActivityId, code: &str, message: String, detail: Option<Value>) {
        if let Some(mut entry) = self.activities.get_mut(&id) {
            entry.error = Some(ActivityFailure {
                code: code.to_string(),
                message,
                detail,
            });
        }
        self.apply_transition(id, ActivityStatus::Failed, None);
    }

    fn notify(&self, activity_id: crate::domain_types::ActivityId, event: ExecutionEvent) {
        let listeners = self.listeners.read().expect("listener lock poisoned").clone();
        let timestamped = TimestampedEvent {
            activity_id,
            at: std::time::SystemTime::now(),
            event,
        };
        for (_, listener) in listeners {
            listener(timestamped.clone());
        }
    }

    /// Requests cancellation of `id`. Returns `false` if no such activity
    /// is active or it is already terminal. The activity is not
    /// guaranteed to be `CANCELLED` by the time this returns — cancellation
    /// is cooperative; the manager forces the transition itself if the
    /// execution has not observed the token within the configured grace
    /// period.
    pub fn cancel_activity(self: &Arc<Self>, id: crate::domain_types::ActivityId, reason: Option<String>) -> bool {
        let Some(control) = self.controls.get(&id) else {
            return false;
        };
        let cancellable = self
            .activities
            .get(&id)
            .map(|entry| !entry.status.is_terminal())
            .unwrap_or(false);
        if !cancellable {
            return false;
        }
        control.cancellation.cancel();
        drop(control);

        let manager = Arc::clone(self);
        let grace_period = self.config.grace_period.as_duration();
        tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            let still_active = manager
                .activities
                .get(&id)
                .map(|entry| !entry.status.is_terminal())
                .unwrap_or(false);
            if still_active {
                manager.finish_cancelled(id, reason);
                manager.controls.remove(&id);
            }
        });
        true
    }

    /// Requests the owning execution pause. Succeeds only if the activity
    /// is currently `RUNNING`.
    pub fn pause_activity(&self, id: crate::domain_types::ActivityId, reason: Option<String>) -> bool {
        let Some(control) = self.controls.get(&id) else {
            return false;
        };
        let transitioned = self.apply_transition(id, ActivityStatus::Paused, reason);
        if transitioned {
            let _ = control.pause_tx.send(true);
        }
        transitioned
    }

    /// Requests the owning execution resume. Succeeds only if the activity
    /// is currently `PAUSED`.
    pub fn resume_activity(&self, id: crate::domain_types::ActivityId) -> bool {
        let Some(control) = self.controls.get(&id) else {
            return false;
        };
        let transitioned = self.apply_transition(id, ActivityStatus::Running, None);
        if transitioned {
            let _ = control.pause_tx.send(false);
        }
        transitioned
    }

    /// Returns a snapshot of `id`, if known.
    #[must_use]
    pub fn get_activity(&self, id: crate::domain_types::ActivityId) -> Option<Activity> {
        self.activities.get(&id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn get_schema(&self, id: &SchemaId) -> Option<ActivitySchema> {
        self.schemas.get(id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn get_all_schemas(&self) -> Vec<ActivitySchema> {
        self.schemas.iter().map(|entry| entry.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_executor_ids(&self) -> Vec<ExecutorPluginId> {
        self.executors.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Filters known activities by every set field of `query`.
    #[must_use]
    pub fn search_activities(&self, query: &ActivityQuery) -> Vec<Activity> {
        self.activities
            .iter()
            .filter(|entry| {
                query.schema_id.as_ref().is_none_or(|s| &entry.value().schema_id == s)
            })
            .filter(|entry| query.status.is_none_or(|s| entry.value().status == s))
            .filter(|entry| {
                query
                    .created_by
                    .as_ref()
                    .is_none_or(|c| &entry.value().created_by == c)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Tallies every known activity's status.
    #[must_use]
    pub fn get_statistics(&self) -> ActivityStatistics {
        let mut stats = ActivityStatistics::default();
        for entry in &self.activities {
            stats.record(entry.value().status);
        }
        stats
    }

    /// Registers a listener notified of every [`TimestampedEvent`] across
    /// every activity. Returns an id for later removal.
    ///
    /// # Panics
    /// Panics if the listener lock is poisoned by an earlier panicking
    /// listener callback.
    pub fn add_event_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().expect("listener lock poisoned").push((id, listener));
        id
    }

    /// Removes a previously registered listener. Returns `false` if `id`
    /// was not found.
    ///
    /// # Panics
    /// Panics if the listener lock is poisoned by an earlier panicking
    /// listener callback.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().expect("listener lock poisoned");
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Cancels every active execution, waits the configured grace period,
    /// then shuts down every registered executor.
    pub async fn shutdown(&self) {
        for entry in &self.controls {
            entry.value().cancellation.cancel();
        }
        tokio::time::sleep(self.config.grace_period.as_duration()).await;
        for entry in &self.executors {
            entry.value().shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::schema::{DataType, ExecutionConstraints, VariableDefinition};
    use crate::activity::validator::ShaclValidator;
    use crate::domain_types::{ActivityId, ExecutorPluginId};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use serde_json::json;

    fn schema_id(s: &str) -> SchemaId {
        SchemaId::try_new(s).unwrap()
    }

    fn plugin_id(s: &str) -> ExecutorPluginId {
        ExecutorPluginId::try_new(s).unwrap()
    }

    struct GreeterExecutor;

    #[async_trait]
    impl ActivityExecutor for GreeterExecutor {
        fn plugin_id(&self) -> &ExecutorPluginId {
            static ID: std::sync::OnceLock<ExecutorPluginId> = std::sync::OnceLock::new();
            ID.get_or_init(|| plugin_id("greeter"))
        }

        async fn execute(
            &self,
            activity: &Activity,
            _schema: &ActivitySchema,
            _context: ExecutionContext,
        ) -> BoxStream<'static, ExecutionEvent> {
            let name = activity
                .input
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("there")
                .to_string();
            let events = vec![
                ExecutionEvent::Started,
                ExecutionEvent::Progress {
                    progress: crate::domain_types::Progress::try_new(0.5).unwrap(),
                    message: None,
                },
                ExecutionEvent::Output(BTreeMap::from([("message".to_string(), json!(format!("Hello, {name}!")))])),
                ExecutionEvent::Completed {
                    output: None,
                    duration_ms: Some(1),
                },
            ];
            stream::iter(events).boxed()
        }
    }

    fn greeting_schema() -> ActivitySchema {
        ActivitySchema {
            id: schema_id("greeting-activity"),
            name: "greeting-activity".to_string(),
            version: "1.0.0".to_string(),
            category: "demo".to_string(),
            executor_plugin_id: plugin_id("greeter"),
            input_schema: BTreeMap::from([(
                "name".to_string(),
                VariableDefinition::new("name", "name")
                    .required()
                    .of_type(DataType::String)
                    .with_length_range(1, 100),
            )]),
            output_schema: BTreeMap::from([(
                "message".to_string(),
                VariableDefinition::new("message", "message").required().with_length_range(1, 1000),
            )]),
            constraints: ExecutionConstraints::default(),
            metadata: BTreeMap::new(),
        }
    }

    async fn manager_with_greeter() -> Arc<ActivityManager> {
        let manager = Arc::new(ActivityManager::new(
            Arc::new(ShaclValidator::new()),
            ActivityManagerConfig::default(),
        ));
        manager.register_executor(Arc::new(GreeterExecutor));
        manager.register_schema(greeting_schema()).await.unwrap();
        manager
    }

    async fn wait_for_terminal(manager: &ActivityManager, id: ActivityId) -> Activity {
        for _ in 0..200 {
            if let Some(activity) = manager.get_activity(id) {
                if activity.status.is_terminal() {
                    return activity;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("activity {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn happy_path_completes_with_expected_output() {
        let manager = manager_with_greeter().await;
        let mut input = BTreeMap::new();
        input.insert("name".to_string(), json!("Alice"));
        let activity = manager
            .start_activity(schema_id("greeting-activity"), input, "user1", None)
            .await
            .unwrap();
        let finished = wait_for_terminal(&manager, activity.id).await;
        assert_eq!(finished.status, ActivityStatus::Completed);
        assert_eq!(finished.output.get("message"), Some(&json!("Hello, Alice!")));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_creating_an_activity() {
        let manager = manager_with_greeter().await;
        let before = manager.get_statistics().total;
        let err = manager
            .start_activity(schema_id("greeting-activity"), BTreeMap::new(), "user1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::ValidationFailed(_)));
        assert_eq!(manager.get_statistics().total, before);
    }

    #[tokio::test]
    async fn unknown_schema_is_rejected() {
        let manager = manager_with_greeter().await;
        let err = manager
            .start_activity(schema_id("no-such-schema"), BTreeMap::new(), "user1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::SchemaNotFound(_)));
    }

    struct ForeverExecutor;

    #[async_trait]
    impl ActivityExecutor for ForeverExecutor {
        fn plugin_id(&self) -> &ExecutorPluginId {
            static ID: std::sync::OnceLock<ExecutorPluginId> = std::sync::OnceLock::new();
            ID.get_or_init(|| plugin_id("forever"))
        }

        async fn execute(
            &self,
            _activity: &Activity,
            _schema: &ActivitySchema,
            context: ExecutionContext,
        ) -> BoxStream<'static, ExecutionEvent> {
            stream::unfold(context, |ctx| async move {
                if ctx.cancellation.is_cancelled() {
                    return Some((ExecutionEvent::Cancelled { reason: None }, ctx));
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Some((
                    ExecutionEvent::Progress {
                        progress: crate::domain_types::Progress::try_new(0.1).unwrap(),
                        message: None,
                    },
                    ctx,
                ))
            })
            .boxed()
        }
    }

    fn forever_schema() -> ActivitySchema {
        ActivitySchema {
            id: schema_id("long-running"),
            name: "long-running".to_string(),
            version: "1.0.0".to_string(),
            category: "demo".to_string(),
            executor_plugin_id: plugin_id("forever"),
            input_schema: BTreeMap::new(),
            output_schema: BTreeMap::new(),
            constraints: ExecutionConstraints::default(),
            metadata: BTreeMap::new(),
        }
    }

    fn forever_schema_with_deadline(max_execution_time_ms: u64) -> ActivitySchema {
        ActivitySchema {
            constraints: ExecutionConstraints {
                max_execution_time_ms: Some(max_execution_time_ms),
                ..ExecutionConstraints::default()
            },
            ..forever_schema()
        }
    }

    #[tokio::test]
    async fn max_execution_time_cancels_without_an_explicit_cancel_call() {
        let manager = Arc::new(ActivityManager::new(
            Arc::new(ShaclValidator::new()),
            ActivityManagerConfig {
                max_concurrent_activities: MaxConcurrentActivities::default(),
                grace_period: GracePeriodMs::try_new(50).unwrap(),
            },
        ));
        manager.register_executor(Arc::new(ForeverExecutor));
        manager.register_schema(forever_schema_with_deadline(20)).await.unwrap();
        let activity = manager
            .start_activity(schema_id("long-running"), BTreeMap::new(), "user1", None)
            .await
            .unwrap();
        let finished = wait_for_terminal(&manager, activity.id).await;
        assert_eq!(finished.status, ActivityStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_activity_reaches_cancelled_within_grace_period() {
        let manager = Arc::new(ActivityManager::new(
            Arc::new(ShaclValidator::new()),
            ActivityManagerConfig {
                max_concurrent_activities: MaxConcurrentActivities::default(),
                grace_period: GracePeriodMs::try_new(50).unwrap(),
            },
        ));
        manager.register_executor(Arc::new(ForeverExecutor));
        manager.register_schema(forever_schema()).await.unwrap();
        let activity = manager
            .start_activity(schema_id("long-running"), BTreeMap::new(), "user1", None)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(manager.cancel_activity(activity.id, Some("test".to_string())));
        let finished = wait_for_terminal(&manager, activity.id).await;
        assert_eq!(finished.status, ActivityStatus::Cancelled);
        assert!(!manager.cancel_activity(activity.id, None));
    }
}
