//! Activity schemas: named, versioned templates for the shape of a unit
//! of work (spec §4.8 component H).

use crate::domain_types::{ExecutorPluginId, MaxRetries, RetryBackoffMultiplier, RetryBaseDelayMs, SchemaId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Data types a [`VariableDefinition`] may constrain a value to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Double,
    Boolean,
    Date,
    DateTime,
    Time,
    Uri,
    LangString,
}

/// Severity a constraint violation is reported at (spec §4.9): only
/// `Violation` causes a [`crate::activity::validator::ValidationResult`]
/// to be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

/// A SHACL-subset constraint on a single named variable of an
/// [`ActivitySchema`]'s input or output shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_count: Option<usize>,
    #[serde(default)]
    pub max_count: Option<usize>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// A regex, applied to string values.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_inclusive: Option<f64>,
    #[serde(default)]
    pub max_inclusive: Option<f64>,
    #[serde(default)]
    pub min_exclusive: Option<f64>,
    #[serde(default)]
    pub max_exclusive: Option<f64>,
    #[serde(default)]
    pub allowed_values: Vec<Value>,
    #[serde(default)]
    pub disallowed_values: Vec<Value>,
    #[serde(default)]
    pub severity: Severity,
}

impl VariableDefinition {
    /// A minimal, unconstrained variable definition.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            data_type: None,
            required: false,
            min_count: None,
            max_count: None,
            min_length: None,
            max_length: None,
            pattern: None,
            min_inclusive: None,
            max_inclusive: None,
            min_exclusive: None,
            max_exclusive: None,
            allowed_values: Vec::new(),
            disallowed_values: Vec::new(),
            severity: Severity::Violation,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn of_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    #[must_use]
    pub fn with_min_inclusive(mut self, min: f64) -> Self {
        self.min_inclusive = Some(min);
        self
    }

    #[must_use]
    pub fn with_length_range(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

/// Retry policy applied to retryable execution failures (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: MaxRetries,
    pub base_delay_ms: RetryBaseDelayMs,
    pub backoff_multiplier: RetryBackoffMultiplier,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MaxRetries::default(),
            base_delay_ms: RetryBaseDelayMs::default(),
            backoff_multiplier: RetryBackoffMultiplier::default(),
        }
    }
}

impl RetryConfig {
    /// Delay before the `attempt`-th retry (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let base = self.base_delay_ms.as_duration();
        let factor = self.backoff_multiplier.as_f64().powi(attempt as i32);
        base.mul_f64(factor)
    }
}

/// Per-schema execution constraints (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConstraints {
    /// Wall-clock budget for one execution attempt. `None` means no
    /// manager-enforced timeout beyond the executor's own behavior.
    #[serde(default)]
    pub max_execution_time_ms: Option<u64>,
    #[serde(default)]
    pub allow_parallel: bool,
    #[serde(default)]
    pub retry_config: Option<RetryConfig>,
}

/// A named, versioned template for a unit of scheduled work (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySchema {
    pub id: SchemaId,
    pub name: String,
    pub version: String,
    pub category: String,
    pub executor_plugin_id: ExecutorPluginId,
    pub input_schema: BTreeMap<String, VariableDefinition>,
    pub output_schema: BTreeMap<String, VariableDefinition>,
    #[serde(default)]
    pub constraints: ExecutionConstraints,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_grows_geometrically() {
        let config = RetryConfig {
            max_retries: MaxRetries::try_new(3).unwrap(),
            base_delay_ms: RetryBaseDelayMs::try_new(100).unwrap(),
            backoff_multiplier: RetryBackoffMultiplier::try_new(2.0).unwrap(),
        };
        assert_eq!(config.delay_for_attempt(0), std::time::Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), std::time::Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), std::time::Duration::from_millis(400));
    }

    #[test]
    fn variable_definition_builder() {
        let var = VariableDefinition::new("age", "age")
            .required()
            .of_type(DataType::Integer)
            .with_min_inclusive(13.0);
        assert!(var.required);
        assert_eq!(var.min_inclusive, Some(13.0));
    }
}
