//! The default SHACL-subset validator (spec §4.9). Evaluates the closed
//! set of per-variable constraints the spec names; it is not a general
//! SHACL engine.

use crate::activity::schema::{ActivitySchema, DataType, Severity, VariableDefinition};
use crate::activity::validator::traits::{
    ActivityValidator, ValidationContext, ValidationIssue, ValidationResult,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Evaluates the SHACL-subset constraints spec §4.9 names, against the
/// `input_schema`/`output_schema` of any [`ActivitySchema`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ShaclValidator;

impl ShaclValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate_against_shape(
        shape: &BTreeMap<String, VariableDefinition>,
        values: &BTreeMap<String, Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();

        for variable in shape.values() {
            let value = values.get(&variable.name);
            let found = Self::validate_one(variable, value, ctx);
            result.merge(found);
        }

        if ctx.options.strict {
            for key in values.keys() {
                if !shape.values().any(|v| &v.name == key) {
                    result = result.with_error(ValidationIssue {
                        path: key.clone(),
                        code: "closed-shape".to_string(),
                        message: format!("unexpected field {key:?} not described by the schema"),
                    });
                }
            }
        }

        result
    }

    fn validate_one(variable: &VariableDefinition, value: Option<&Value>, ctx: &ValidationContext) -> ValidationResult {
        match value {
            None => {
                if variable.required {
                    return Self::report(variable, "required", format!("{:?} is required", variable.name));
                }
                ValidationResult::valid()
            }
            Some(value) => {
                let mut result = ValidationResult::valid();
                if let Some(data_type) = variable.data_type {
                    if !matches_data_type(data_type, value) {
                        result.merge(Self::report(
                            variable,
                            "data-type",
                            format!("{:?} does not match expected type {data_type:?}", variable.name),
                        ));
                    }
                }
                result.merge(Self::validate_list_bounds(variable, value));
                result.merge(Self::validate_string_constraints(variable, value));
                result.merge(Self::validate_numeric_constraints(variable, value));
                result.merge(Self::validate_value_set(variable, value));
                let _ = ctx;
                result
            }
        }
    }

    fn validate_list_bounds(variable: &VariableDefinition, value: &Value) -> ValidationResult {
        let Value::Array(items) = value else {
            return ValidationResult::valid();
        };
        let mut result = ValidationResult::valid();
        if let Some(min) = variable.min_count {
            if items.len() < min {
                result.merge(Self::report(
                    variable,
                    "min-count",
                    format!("{:?} has {} item(s), fewer than the minimum {min}", variable.name, items.len()),
                ));
            }
        }
        if let Some(max) = variable.max_count {
            if items.len() > max {
                result.merge(Self::report(
                    variable,
                    "max-count",
                    format!("{:?} has {} item(s), more than the maximum {max}", variable.name, items.len()),
                ));
            }
        }
        result
    }

    fn validate_string_constraints(variable: &VariableDefinition, value: &Value) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::valid();
        };
        let mut result = ValidationResult::valid();
        let len = text.chars().count();
        if let Some(min) = variable.min_length {
            if len < min {
                result.merge(Self::report(
                    variable,
                    "min-length",
                    format!("{:?} has length {len}, shorter than the minimum {min}", variable.name),
                ));
            }
        }
        if let Some(max) = variable.max_length {
            if len > max {
                result.merge(Self::report(
                    variable,
                    "max-length",
                    format!("{:?} has length {len}, longer than the maximum {max}", variable.name),
                ));
            }
        }
        if let Some(pattern) = &variable.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(text) => {
                    result.merge(Self::report(
                        variable,
                        "pattern",
                        format!("{:?} does not match pattern {pattern:?}", variable.name),
                    ));
                }
                Ok(_) => {}
                Err(_) => {
                    result.merge(Self::report(
                        variable,
                        "pattern",
                        format!("constraint pattern {pattern:?} on {:?} is not a valid regex", variable.name),
                    ));
                }
            }
        }
        result
    }

    fn validate_numeric_constraints(variable: &VariableDefinition, value: &Value) -> ValidationResult {
        let Some(number) = value.as_f64() else {
            return ValidationResult::valid();
        };
        let mut result = ValidationResult::valid();
        if let Some(min) = variable.min_inclusive {
            if number < min {
                result.merge(Self::report(
                    variable,
                    "min-inclusive",
                    format!("{:?}={number} is below the minimum (inclusive) {min}", variable.name),
                ));
            }
        }
        if let Some(max) = variable.max_inclusive {
            if number > max {
                result.merge(Self::report(
                    variable,
                    "max-inclusive",
                    format!("{:?}={number} is above the maximum (inclusive) {max}", variable.name),
                ));
            }
        }
        if let Some(min) = variable.min_exclusive {
            if number <= min {
                result.merge(Self::report(
                    variable,
                    "min-exclusive",
                    format!("{:?}={number} is not above the exclusive minimum {min}", variable.name),
                ));
            }
        }
        if let Some(max) = variable.max_exclusive {
            if number >= max {
                result.merge(Self::report(
                    variable,
                    "max-exclusive",
                    format!("{:?}={number} is not below the exclusive maximum {max}", variable.name),
                ));
            }
        }
        result
    }

    fn validate_value_set(variable: &VariableDefinition, value: &Value) -> ValidationResult {
        let mut result = ValidationResult::valid();
        if !variable.allowed_values.is_empty() && !variable.allowed_values.contains(value) {
            result.merge(Self::report(
                variable,
                "allowed-values",
                format!("{:?} is not one of the allowed values", variable.name),
            ));
        }
        if variable.disallowed_values.contains(value) {
            result.merge(Self::report(
                variable,
                "disallowed-values",
                format!("{:?} is one of the disallowed values", variable.name),
            ));
        }
        result
    }

    fn report(variable: &VariableDefinition, code: &str, message: String) -> ValidationResult {
        let issue = ValidationIssue {
            path: variable.name.clone(),
            code: code.to_string(),
            message,
        };
        match variable.severity {
            Severity::Violation => ValidationResult::valid().with_error(issue),
            Severity::Warning | Severity::Info => ValidationResult::valid().with_warning(issue),
        }
    }
}

fn matches_data_type(data_type: DataType, value: &Value) -> bool {
    match data_type {
        DataType::String | DataType::LangString | DataType::Uri | DataType::Date | DataType::DateTime | DataType::Time => {
            value.is_string()
        }
        DataType::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
        DataType::Decimal | DataType::Double => value.is_number(),
        DataType::Boolean => value.is_boolean(),
    }
}

#[async_trait]
impl ActivityValidator for ShaclValidator {
    fn name(&self) -> &str {
        "shacl-subset"
    }

    fn can_validate(&self, _schema: &ActivitySchema) -> bool {
        true
    }

    async fn validate_schema(&self, schema: &ActivitySchema, _ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::valid();
        if schema.name.is_empty() {
            result = result.with_error(ValidationIssue {
                path: "name".to_string(),
                code: "required".to_string(),
                message: "schema name must not be empty".to_string(),
            });
        }
        result
    }

    async fn validate_input(
        &self,
        schema: &ActivitySchema,
        input: &BTreeMap<String, Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        Self::validate_against_shape(&schema.input_schema, input, ctx)
    }

    async fn validate_output(
        &self,
        schema: &ActivitySchema,
        output: &BTreeMap<String, Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        Self::validate_against_shape(&schema.output_schema, output, ctx)
    }

    async fn validate_variable(
        &self,
        variable: &VariableDefinition,
        value: &Value,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        Self::validate_one(variable, Some(value), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::validator::traits::ValidationPhase;
    use crate::domain_types::{ExecutorPluginId, SchemaId};
    use serde_json::json;

    fn ctx() -> ValidationContext {
        ValidationContext::new(ValidationPhase::Input, "test")
    }

    fn schema_with(variables: Vec<VariableDefinition>) -> ActivitySchema {
        ActivitySchema {
            id: SchemaId::try_new("user-registration").unwrap(),
            name: "user-registration".to_string(),
            version: "1.0.0".to_string(),
            category: "test".to_string(),
            executor_plugin_id: ExecutorPluginId::try_new("noop").unwrap(),
            input_schema: variables.into_iter().map(|v| (v.name.clone(), v)).collect(),
            output_schema: BTreeMap::new(),
            constraints: Default::default(),
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn rejects_age_below_min_inclusive() {
        let schema = schema_with(vec![VariableDefinition::new("age", "age")
            .required()
            .of_type(DataType::Integer)
            .with_min_inclusive(13.0)]);
        let validator = ShaclValidator::new();
        let mut input = BTreeMap::new();
        input.insert("age".to_string(), json!(5));
        let result = validator.validate_input(&schema, &input, &ctx()).await;
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.path == "age" && e.code == "min-inclusive"));
    }

    #[tokio::test]
    async fn accepts_valid_input() {
        let schema = schema_with(vec![VariableDefinition::new("name", "name")
            .required()
            .of_type(DataType::String)
            .with_length_range(1, 100)]);
        let validator = ShaclValidator::new();
        let mut input = BTreeMap::new();
        input.insert("name".to_string(), json!("Alice"));
        let result = validator.validate_input(&schema, &input, &ctx()).await;
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_is_an_error() {
        let schema = schema_with(vec![VariableDefinition::new("name", "name").required()]);
        let validator = ShaclValidator::new();
        let result = validator.validate_input(&schema, &BTreeMap::new(), &ctx()).await;
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].code, "required");
    }

    #[tokio::test]
    async fn warning_severity_does_not_invalidate() {
        let mut variable = VariableDefinition::new("nickname", "nickname").required();
        variable.severity = Severity::Warning;
        let schema = schema_with(vec![variable]);
        let validator = ShaclValidator::new();
        let result = validator.validate_input(&schema, &BTreeMap::new(), &ctx()).await;
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }
}
