//! Response validation - enforces the top-level shape of the listing payload

use serde_json::Value;
use thiserror::Error;

use crate::model::Listing;

/// Validation errors for the decoded listing payload
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Listing API returned an empty result")]
    EmptyResult,
    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Check the payload is a non-empty array and hand back its records
///
/// Only the top-level shape is checked here; records are passed on untouched.
pub fn validate_response(raw: Value) -> Result<Vec<Value>, ValidationError> {
    match raw {
        Value::Null => Err(ValidationError::EmptyResult),
        Value::Array(records) if records.is_empty() => Err(ValidationError::EmptyResult),
        Value::Array(records) => Ok(records),
        Value::Object(map) if map.is_empty() => Err(ValidationError::EmptyResult),
        Value::String(s) if s.is_empty() => Err(ValidationError::EmptyResult),
        other => Err(ValidationError::Shape(format!(
            "expected an array of listings, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decode records into listings, dropping the ones without a usable identifier
///
/// Returns the listings in upstream order and the number of dropped records.
pub fn decode_listings(records: Vec<Value>) -> (Vec<Listing>, usize) {
    let mut listings = Vec::with_capacity(records.len());
    let mut malformed = 0;

    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Listing>(record) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                malformed += 1;
                tracing::warn!(index, error = %e, "Skipping listing record without usable id");
            }
        }
    }

    (listings, malformed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
