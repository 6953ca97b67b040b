//! Validation of filled-in form data against a form's resolved schema.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};
use crate::flatten::clean;
use crate::parser::JsonParser;
use crate::registry::SchemaRegistry;

/// Validate a payload against the schema registered as `form`.
///
/// The schema is reference-resolved but not flattened, so `properties`,
/// `required` and the other keywords keep their meaning.
///
/// # Errors
///
/// Returns `ValidateError::Parse` if the schema is unknown,
/// `ValidateError::InvalidSchema` if it still contains unresolved references,
/// or `ValidateError::Invalid` if the payload doesn't match.
pub fn validate(registry: &SchemaRegistry, form: &str, payload: &Value) -> Result<(), ValidateError> {
    let resolved = JsonParser::new(registry).resolve(form)?;

    let mut unresolved = Vec::new();
    resolved.for_each_marker(&mut |marker| {
        unresolved.push(format!(
            "{} ({})",
            marker.target,
            marker.error.as_deref().unwrap_or_default()
        ));
    });
    if !unresolved.is_empty() {
        return Err(ValidateError::InvalidSchema {
            message: format!("unresolved references: {}", unresolved.join(", ")),
        });
    }

    // Inlined documents keep their own $id, which would rebase nothing useful
    let ids: BTreeSet<String> = ["$id".to_string()].into();
    validate_against_schema(&clean(&resolved, &ids).to_value(), payload)
}

/// Validate a payload against an already-resolved schema.
///
/// Use this when you've already resolved the schema and want to validate
/// multiple payloads against it.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
