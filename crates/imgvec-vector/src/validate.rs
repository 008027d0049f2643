//! Checks run before a record is handed to any backend.
//!
//! Order is fixed: shape, then length, then element type. The first failure
//! wins.

use serde_json::Value;

use imgvec_core::ValidationError;

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates a loosely typed vector and returns it as `f32` values.
/// Numbers beyond the `f32` range are `OutOfRange`, not silently infinite.
pub fn validate_json(value: &Value, dimension: usize) -> Result<Vec<f32>, ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::NotASequence { found: kind_of(value).to_string() })?;
    if items.len() != dimension {
        return Err(ValidationError::DimensionMismatch { expected: dimension, got: items.len() });
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item.as_f64() {
            Some(x) if (x as f32).is_finite() => Ok(x as f32),
            Some(_) => Err(ValidationError::OutOfRange { index }),
            None => Err(ValidationError::NonNumeric { index }),
        })
        .collect()
}

/// Typed counterpart of [`validate_json`]. NaN and infinities count as
/// non-numeric.
pub fn validate_values(values: &[f32], dimension: usize) -> Result<(), ValidationError> {
    if values.len() != dimension {
        return Err(ValidationError::DimensionMismatch { expected: dimension, got: values.len() });
    }
    match values.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(ValidationError::NonNumeric { index }),
        None => Ok(()),
    }
}

pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}
