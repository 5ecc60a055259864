// crates/fieldgate-rules/src/coerce.rs
// ============================================================================
// Module: Coercion Helpers
// Description: Serde bridges between raw input and map-shaped values.
// Purpose: Move text, bytes, and typed structs into and out of the value
//          shape the evaluator consumes.
// Dependencies: fieldgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The evaluator operates on [`serde_json::Value`]. These helpers parse raw
//! text or bytes into that shape and bridge typed structs both ways through
//! serde. Every failure is reported as [`ErrorKind::Coercion`] at the
//! provided path, so callers can feed the error straight into a collection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use fieldgate_core::ErrorKind;
use fieldgate_core::PathContext;
use fieldgate_core::ValidationError;

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses JSON text into a value.
///
/// # Errors
///
/// Returns [`ErrorKind::Coercion`] at `path` when the text is not valid
/// JSON.
pub fn from_str(text: &str, path: &PathContext) -> Result<Value, ValidationError> {
    serde_json::from_str(text).map_err(|err| coercion(path, &err))
}

/// Parses JSON bytes into a value.
///
/// # Errors
///
/// Returns [`ErrorKind::Coercion`] at `path` when the bytes are not valid
/// JSON.
pub fn from_slice(bytes: &[u8], path: &PathContext) -> Result<Value, ValidationError> {
    serde_json::from_slice(bytes).map_err(|err| coercion(path, &err))
}

// ============================================================================
// SECTION: Typed Bridges
// ============================================================================

/// Serializes a typed struct into the map-shaped value the evaluator
/// consumes.
///
/// # Errors
///
/// Returns [`ErrorKind::Coercion`] at `path` when serialization fails.
pub fn from_shape<T: Serialize>(shape: &T, path: &PathContext) -> Result<Value, ValidationError> {
    serde_json::to_value(shape).map_err(|err| coercion(path, &err))
}

/// Deserializes a validated output value back into a typed struct.
///
/// # Errors
///
/// Returns [`ErrorKind::Coercion`] at `path` when the value does not fit
/// the target type.
pub fn to_shape<T: DeserializeOwned>(value: Value, path: &PathContext) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|err| coercion(path, &err))
}

/// Builds a coercion error from a serde failure.
fn coercion(path: &PathContext, err: &serde_json::Error) -> ValidationError {
    ValidationError::new(ErrorKind::Coercion, err.to_string(), path.clone())
}
