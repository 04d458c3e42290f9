//! Schema definitions for front-matter fields.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Type of a front-matter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// String value.
    String,
    /// Numeric value (integer or float).
    Number,
    /// Boolean value.
    Boolean,
    /// Date in YYYY-MM-DD format.
    Date,
    /// Array of values.
    List,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constraints for a single front-matter field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Expected field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,

    /// Allowed values for enum-like string fields.
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<String>>,

    /// Regex pattern string fields must match.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Minimum numeric value.
    #[serde(default)]
    pub min: Option<f64>,

    /// Maximum numeric value.
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldSchema {
    /// A required field of the given type with no further constraints.
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            enum_values: None,
            pattern: None,
            min: None,
            max: None,
        }
    }

    /// An optional field of the given type.
    pub fn optional(field_type: FieldType) -> Self {
        Self { required: false, ..Self::required(field_type) }
    }
}

/// Schema for one filetype: field name → constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSchema {
    pub fields: BTreeMap<String, FieldSchema>,
}

impl DocumentSchema {
    pub fn with_field(mut self, name: &str, schema: FieldSchema) -> Self {
        self.fields.insert(name.to_string(), schema);
        self
    }
}

/// Registered validators, keyed by filetype name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, DocumentSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filetype: &str, schema: DocumentSchema) {
        self.schemas.insert(filetype.to_string(), schema);
    }

    pub fn get(&self, filetype: &str) -> Option<&DocumentSchema> {
        self.schemas.get(filetype)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl From<HashMap<String, DocumentSchema>> for SchemaRegistry {
    fn from(schemas: HashMap<String, DocumentSchema>) -> Self {
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            "blog",
            DocumentSchema::default()
                .with_field("title", FieldSchema::required(FieldType::String)),
        );

        assert!(registry.get("blog").is_some());
        assert!(registry.get("note").is_none());
    }

    #[test]
    fn schema_deserializes_from_toml_shape() {
        let toml = r#"
            [title]
            type = "string"
            required = true

            [draft]
            type = "boolean"
        "#;
        let schema: DocumentSchema = toml::from_str(toml).unwrap();
        assert!(schema.fields["title"].required);
        assert_eq!(schema.fields["draft"].field_type, FieldType::Boolean);
        assert!(!schema.fields["draft"].required);
    }
}
