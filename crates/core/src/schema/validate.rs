//! Record validation against registered schemas.

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use super::types::{FieldSchema, FieldType, SchemaRegistry};
use crate::document::DocumentRecord;

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingRequired { field: String },

    #[error("invalid type for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("enum constraint violated for '{field}': '{value}' not in {allowed:?}")]
    EnumViolation {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Outcome of validating one record.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.valid = false;
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        if !other.valid {
            self.valid = false;
        }
    }
}

/// Validate a record's metadata against the schema registered for its
/// filetype. Records without a filetype, or with an unregistered one, pass
/// trivially.
pub fn validate_record(registry: &SchemaRegistry, record: &DocumentRecord) -> ValidationResult {
    let schema = match record.filetype.as_deref().and_then(|t| registry.get(t)) {
        Some(schema) => schema,
        None => return ValidationResult::success(),
    };

    let mut result = ValidationResult::success();

    for (field, constraints) in &schema.fields {
        match record.metadata.get(field) {
            None | Some(serde_json::Value::Null) => {
                if constraints.required {
                    result.add_error(ValidationError::MissingRequired {
                        field: field.clone(),
                    });
                }
            }
            Some(value) => {
                result.merge(validate_field(field, constraints, value));
            }
        }
    }

    result
}

fn validate_field(
    field: &str,
    schema: &FieldSchema,
    value: &serde_json::Value,
) -> ValidationResult {
    let mut result = ValidationResult::success();

    let type_ok = match (schema.field_type, value) {
        (FieldType::String, serde_json::Value::String(_)) => true,
        (FieldType::Number, serde_json::Value::Number(_)) => true,
        (FieldType::Boolean, serde_json::Value::Bool(_)) => true,
        (FieldType::List, serde_json::Value::Array(_)) => true,
        (FieldType::Date, serde_json::Value::String(s)) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        _ => false,
    };

    if !type_ok {
        result.add_error(ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: schema.field_type.to_string(),
            actual: json_type_name(value).to_string(),
        });
        return result;
    }

    if let serde_json::Value::String(s) = value {
        if let Some(allowed) = &schema.enum_values {
            if !allowed.contains(s) {
                result.add_error(ValidationError::EnumViolation {
                    field: field.to_string(),
                    value: s.clone(),
                    allowed: allowed.clone(),
                });
            }
        }

        if let Some(pattern) = &schema.pattern {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(s) {
                        result.add_error(ValidationError::InvalidValue {
                            field: field.to_string(),
                            message: format!("'{s}' does not match pattern '{pattern}'"),
                        });
                    }
                }
                Err(_) => result.add_error(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("schema pattern '{pattern}' is not a valid regex"),
                }),
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.min {
            if n < min {
                result.add_error(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("value {n} is less than minimum {min}"),
                });
            }
        }
        if let Some(max) = schema.max {
            if n > max {
                result.add_error(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("value {n} is greater than maximum {max}"),
                });
            }
        }
    }

    result
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::DocumentSchema;

    fn record_with(filetype: &str, metadata: serde_json::Value) -> DocumentRecord {
        DocumentRecord {
            id: "x".into(),
            file_path: "a.md".into(),
            extension: "md".into(),
            url_path: "a.md".into(),
            filetype: Some(filetype.into()),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            tags: Vec::new(),
            links: Vec::new(),
            tasks: Vec::new(),
        }
    }

    fn blog_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            "blog",
            DocumentSchema::default()
                .with_field("title", FieldSchema::required(FieldType::String))
                .with_field("date", FieldSchema::optional(FieldType::Date)),
        );
        registry
    }

    #[test]
    fn unregistered_filetype_passes() {
        let registry = blog_registry();
        let record = record_with("note", serde_json::json!({}));
        assert!(validate_record(&registry, &record).valid);
    }

    #[test]
    fn missing_required_field_fails() {
        let registry = blog_registry();
        let record = record_with("blog", serde_json::json!({}));
        let result = validate_record(&registry, &record);
        assert!(!result.valid);
        assert!(matches!(
            result.errors[0],
            ValidationError::MissingRequired { .. }
        ));
    }

    #[test]
    fn type_mismatch_fails() {
        let registry = blog_registry();
        let record = record_with("blog", serde_json::json!({"title": 7}));
        let result = validate_record(&registry, &record);
        assert!(matches!(
            result.errors[0],
            ValidationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn date_format_is_checked() {
        let registry = blog_registry();
        let good = record_with(
            "blog",
            serde_json::json!({"title": "t", "date": "2024-05-01"}),
        );
        assert!(validate_record(&registry, &good).valid);

        let bad = record_with(
            "blog",
            serde_json::json!({"title": "t", "date": "May 1st"}),
        );
        assert!(!validate_record(&registry, &bad).valid);
    }

    #[test]
    fn enum_and_range_constraints() {
        let mut registry = SchemaRegistry::new();
        let mut status = FieldSchema::required(FieldType::String);
        status.enum_values = Some(vec!["draft".into(), "published".into()]);
        let mut weight = FieldSchema::optional(FieldType::Number);
        weight.min = Some(0.0);
        weight.max = Some(100.0);
        registry.register(
            "post",
            DocumentSchema::default()
                .with_field("status", status)
                .with_field("weight", weight),
        );

        let ok = record_with(
            "post",
            serde_json::json!({"status": "draft", "weight": 10}),
        );
        assert!(validate_record(&registry, &ok).valid);

        let bad = record_with(
            "post",
            serde_json::json!({"status": "pending", "weight": 1000}),
        );
        let result = validate_record(&registry, &bad);
        assert_eq!(result.errors.len(), 2);
    }
}
