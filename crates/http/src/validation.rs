//! Field validation for request bodies.
//!
//! Request types derive [`validator::Validate`] and declare the name each
//! field is reported under. Failures are flattened into [`FieldViolation`]s
//! whose message comes from the failed rule's code.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Names under which a request type reports its fields.
pub trait FieldNames {
    /// `(struct field, reported name)` pairs in reporting order.
    const FIELD_NAMES: &'static [(&'static str, &'static str)];
}

/// Run the derived rules and list every failure, declared fields first in
/// declaration order, then any others sorted by name.
pub fn check<T: Validate + FieldNames>(value: &T) -> Result<(), Vec<FieldViolation>> {
    let errors = match value.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut by_field: HashMap<String, &Vec<ValidationError>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| (field.to_string(), errors))
        .collect();

    let mut violations = Vec::new();
    for (field, reported) in T::FIELD_NAMES {
        if let Some(errors) = by_field.remove(*field) {
            violations.extend(errors.iter().map(|error| violation(reported, error)));
        }
    }

    let mut rest: Vec<_> = by_field.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (field, errors) in rest {
        violations.extend(errors.iter().map(|error| violation(&field, error)));
    }

    Err(violations)
}

fn violation(field: &str, error: &ValidationError) -> FieldViolation {
    FieldViolation {
        field: field.to_string(),
        message: message_for(field, error),
    }
}

/// Human-readable message for a failed rule, keyed by its code.
pub fn message_for(field: &str, error: &ValidationError) -> String {
    let param = |name: &str| error.params.get(name).and_then(|value| value.as_u64());

    match error.code.as_ref() {
        "required" => format!("{field} is required"),
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("{field} must be between {min} and {max} characters")
            }
            (Some(min), None) => format!("{field} must be at least {min} characters"),
            (None, Some(max)) => format!("{field} must be at most {max} characters"),
            (None, None) => format!("{field} is invalid"),
        },
        "uuid" => format!("{field} must be a valid UUID"),
        _ => format!("{field} is invalid"),
    }
}

/// Decode a string field, treating JSON `null` like an absent value.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
