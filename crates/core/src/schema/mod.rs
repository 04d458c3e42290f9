//! Per-filetype metadata schemas and validation.
//!
//! A schema is registered under a filetype name; records whose `filetype`
//! has no registered schema pass trivially. During a one-shot index run
//! every record must validate before anything is written.

pub mod types;
pub mod validate;

use thiserror::Error;

pub use types::{DocumentSchema, FieldSchema, FieldType, SchemaRegistry};
pub use validate::{validate_record, ValidationError, ValidationResult};

/// Aggregate failure for a whole indexing batch.
///
/// Wording is stable: callers match on the error kind, humans read this.
#[derive(Debug, Error)]
#[error("Validation Failed: unable to validate files against the specified schema")]
pub struct BatchValidationError {
    /// Per-file failures, in scan order.
    pub failures: Vec<FileValidation>,
}

/// Validation outcome for a single file.
#[derive(Debug)]
pub struct FileValidation {
    pub path: String,
    pub result: ValidationResult,
}
