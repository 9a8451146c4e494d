//! The `Activity` instance and its status state machine (spec §4.8
//! component H).

use crate::domain_types::{ActivityId, CorrelationId, Progress, SchemaId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// An activity's lifecycle status.
///
/// Transitions not drawn in spec §4.8's diagram are illegal — see
/// [`ActivityStatus::can_transition_to`]. `Completed`, `Failed`, and
/// `Cancelled` are terminal: no status follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Created,
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl ActivityStatus {
    /// Whether this status has no outbound transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `self → next` is a legal transition per spec §4.8's diagram:
    /// `CREATED → QUEUED → RUNNING → {COMPLETED | FAILED | CANCELLED}`,
    /// with `RUNNING ↔ PAUSED`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ActivityStatus::{Cancelled, Completed, Created, Failed, Paused, Queued, Running};
        matches!(
            (self, next),
            (Created, Queued)
                | (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Running, Paused)
                | (Paused, Running)
                | (Paused, Cancelled)
        )
    }
}

/// Details of a terminal `Failed` activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFailure {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub detail: Option<Value>,
}

/// One entry of an activity's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: Option<ActivityStatus>,
    pub to: ActivityStatus,
    pub at: SystemTime,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A declarative unit of scheduled work, as a caller-visible snapshot.
///
/// Per spec §4.8, activities are created and mutated only by the owning
/// [`crate::activity::manager::ActivityManager`]; everything a caller
/// observes via `GetActivity`/`SearchActivities` is an immutable clone of
/// the manager's internal record at the moment of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub schema_id: SchemaId,
    pub status: ActivityStatus,
    pub input: BTreeMap<String, Value>,
    pub output: BTreeMap<String, Value>,
    pub progress: Progress,
    pub error: Option<ActivityFailure>,
    pub created_by: String,
    pub correlation_id: Option<CorrelationId>,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
    pub history: Vec<StatusTransition>,
}

impl Activity {
    /// Creates a fresh activity in `CREATED` status.
    #[must_use]
    pub fn new(
        schema_id: SchemaId,
        input: BTreeMap<String, Value>,
        created_by: impl Into<String>,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            id: ActivityId::generate(),
            schema_id,
            status: ActivityStatus::Created,
            input,
            output: BTreeMap::new(),
            progress: Progress::default(),
            error: None,
            created_by: created_by.into(),
            correlation_id,
            created_at: now,
            started_at: None,
            finished_at: None,
            history: vec![StatusTransition {
                from: None,
                to: ActivityStatus::Created,
                at: now,
                reason: None,
            }],
        }
    }

    /// Attempts the transition `self.status → next`, recording it in
    /// `history` and returning `true` on success. An illegal transition
    /// leaves the activity untouched and returns `false`.
    pub fn transition_to(&mut self, next: ActivityStatus, reason: Option<String>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        let now = SystemTime::now();
        if next == ActivityStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.finished_at = Some(now);
        }
        self.history.push(StatusTransition {
            from: Some(self.status),
            to: next,
            at: now,
            reason,
        });
        self.status = next;
        true
    }
}
