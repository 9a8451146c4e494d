//! The `ActivityValidator` contract and its supporting types (spec §4.9
//! component I).

use crate::activity::schema::ActivitySchema;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which validation call is in flight, carried on [`ValidationContext`] so
/// a validator can vary behavior by phase (e.g. stricter on `Input` than
/// `Runtime`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    Schema,
    Input,
    Output,
    Runtime,
}

/// Per-call validation options (spec §4.9).
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Unknown fields not described by the schema are themselves a violation.
    pub strict: bool,
    /// Unknown fields are tolerated (meaningful only when `strict` is false
    /// but a caller still wants to flag them as warnings rather than ignore
    /// them silently).
    pub allow_unknown: bool,
    /// Whether nested/composite values are walked recursively.
    pub recursive: bool,
    /// Recursion depth ceiling when `recursive` is set.
    pub max_depth: u32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            allow_unknown: true,
            recursive: true,
            max_depth: 8,
        }
    }
}

/// Context threaded through every `ActivityValidator` call.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub phase: ValidationPhase,
    pub caller: String,
    pub options: ValidationOptions,
}

impl ValidationContext {
    #[must_use]
    pub fn new(phase: ValidationPhase, caller: impl Into<String>) -> Self {
        Self {
            phase,
            caller: caller.into(),
            options: ValidationOptions::default(),
        }
    }
}

/// One validation finding — a violation if `severity` is
/// [`crate::activity::schema::Severity::Violation`], otherwise collected
/// as a warning instead (spec §4.9: "violations are promoted to errors
/// unless the shape's severity is WARNING or INFO").
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Dotted path to the offending field, e.g. `"age"`.
    pub path: String,
    /// A stable, machine-readable constraint code, e.g.
    /// `"min-inclusive"`.
    pub code: String,
    pub message: String,
}

/// The outcome of one validation call.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationResult {
    /// An empty, successful result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Merges `other` into `self`, combining errors/warnings and
    /// downgrading `is_valid` to `false` if either side was invalid.
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.metadata.extend(other.metadata);
    }

    #[must_use]
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.is_valid = false;
        self.errors.push(issue);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A pluggable validator for activity schemas, inputs, outputs, and
/// individual variable values (spec §4.9).
#[async_trait]
pub trait ActivityValidator: Send + Sync {
    /// A stable name, used in logs and the management surface.
    fn name(&self) -> &str;

    /// Whether this validator applies to `schema` at all — lets a
    /// composite validator skip validators scoped to a category or
    /// executor it doesn't recognize.
    fn can_validate(&self, schema: &ActivitySchema) -> bool;

    /// Validates the schema definition itself (e.g. at `RegisterSchema`).
    async fn validate_schema(&self, schema: &ActivitySchema, ctx: &ValidationContext) -> ValidationResult;

    /// Validates a candidate activity input against `schema.input_schema`.
    async fn validate_input(
        &self,
        schema: &ActivitySchema,
        input: &BTreeMap<String, Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult;

    /// Validates a candidate activity output against `schema.output_schema`.
    async fn validate_output(
        &self,
        schema: &ActivitySchema,
        output: &BTreeMap<String, Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult;

    /// Validates a single value against one variable definition, used for
    /// targeted re-validation (e.g. a UI live-checking one field).
    async fn validate_variable(
        &self,
        variable: &crate::activity::schema::VariableDefinition,
        value: &Value,
        ctx: &ValidationContext,
    ) -> ValidationResult;

    /// Called once when the validator is registered.
    async fn init(&self) {}

    /// Called once when the validator is removed or the node shuts down.
    async fn shutdown(&self) {}
}
