//! The Activity Model and Manager (spec §4.8-§4.9): declarative units of
//! scheduled work, validated against registered schemas and driven to
//! completion by pluggable executors.

pub mod executor;
pub mod manager;
pub mod model;
pub mod schema;
pub mod statistics;
pub mod validator;

pub use executor::{ActivityExecutor, ExecutionContext, ExecutionEvent, TimestampedEvent};
pub use manager::{ActivityError, ActivityManager, ActivityManagerConfig, ActivityQuery, ListenerId};
pub use model::{Activity, ActivityFailure, ActivityStatus, StatusTransition};
pub use schema::{ActivitySchema, DataType, ExecutionConstraints, RetryConfig, Severity, VariableDefinition};
pub use statistics::{calculate_percentage_f32, ActivityStatistics};
pub use validator::{
    ActivityValidator, CompositeStrategy, CompositeValidator, PrioritizedValidator, ShaclValidator, ValidationContext,
    ValidationIssue, ValidationOptions, ValidationPhase, ValidationResult,
};
