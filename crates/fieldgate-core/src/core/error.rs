// crates/fieldgate-core/src/core/error.rs
// ============================================================================
// Module: Fieldgate Error Model
// Description: Validation errors and path-annotated error collections.
// Purpose: Aggregate rule failures with stable codes and concrete paths.
// Dependencies: crate::core::path, serde_json
// ============================================================================

//! ## Overview
//! Every validation failure is a [`ValidationError`] carrying a stable
//! [`ErrorKind`] code, a human-readable message, and the [`PathContext`] at
//! which it occurred. An [`ErrorCollection`] is an ordered sequence of such
//! errors; an empty collection signals success. Callers can render either
//! per error or per collection in any [`PathFormat`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::path::PathContext;
use crate::core::path::PathFormat;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Closed taxonomy of validation failure kinds.
///
/// # Invariants
/// - Variants and codes are stable for programmatic handling and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field was missing from the input.
    Required,
    /// A value fell below a configured minimum.
    BelowMinimum,
    /// A value exceeded a configured maximum.
    AboveMaximum,
    /// A value could not be coerced into the expected type.
    Coercion,
    /// A value did not match a configured pattern.
    PatternMismatch,
    /// A value was outside the allowed set.
    NotAllowed,
    /// A value was inside the forbidden set.
    Forbidden,
    /// An input key had no bound rule and unknown keys are disallowed.
    UnexpectedField,
    /// Evaluation exceeded the configured deadline.
    Timeout,
    /// Evaluation was cancelled by the caller.
    Cancelled,
    /// A programming-error invariant was violated at validation time.
    InternalInvariant,
}

impl ErrorKind {
    /// Returns the stable error code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Required => "required_field_missing",
            Self::BelowMinimum => "below_minimum",
            Self::AboveMaximum => "above_maximum",
            Self::Coercion => "type_coercion_failure",
            Self::PatternMismatch => "pattern_mismatch",
            Self::NotAllowed => "value_not_allowed",
            Self::Forbidden => "value_forbidden",
            Self::UnexpectedField => "unexpected_field",
            Self::Timeout => "operation_timeout",
            Self::Cancelled => "operation_cancelled",
            Self::InternalInvariant => "internal_invariant_violation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// SECTION: Validation Error
// ============================================================================

/// One validation failure with its kind, message, and capture path.
///
/// # Invariants
/// - `path` locates the failing value from the validation root.
/// - `nested` carries aggregate member failures and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Failure kind from the closed taxonomy.
    kind: ErrorKind,
    /// Human-readable message.
    message: String,
    /// Path captured at the point of failure.
    path: PathContext,
    /// Nested failures for aggregate errors.
    nested: ErrorCollection,
}

impl ValidationError {
    /// Creates a validation error at the provided path.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, path: PathContext) -> Self {
        Self {
            kind,
            message: message.into(),
            path,
            nested: ErrorCollection::new(),
        }
    }

    /// Attaches nested member failures to this error.
    #[must_use]
    pub fn with_nested(mut self, nested: ErrorCollection) -> Self {
        self.nested = nested;
        self
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the capture path.
    #[must_use]
    pub const fn path(&self) -> &PathContext {
        &self.path
    }

    /// Returns the nested member failures.
    #[must_use]
    pub const fn nested(&self) -> &ErrorCollection {
        &self.nested
    }

    /// Renders the error as a JSON value in the requested path format.
    #[must_use]
    pub fn to_json(&self, format: PathFormat) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("code".to_string(), Value::String(self.kind.code().to_string()));
        object.insert("message".to_string(), Value::String(self.message.clone()));
        object.insert("path".to_string(), Value::String(self.path.render(format)));
        if !self.nested.is_empty() {
            object.insert("nested".to_string(), self.nested.to_json(format));
        }
        Value::Object(object)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind.code(), self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// SECTION: Error Collection
// ============================================================================

/// Ordered collection of validation errors; empty means success.
///
/// # Invariants
/// - Errors preserve arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollection {
    /// Collected errors in arrival order.
    errors: Vec<ValidationError>,
}

impl ErrorCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
        }
    }

    /// Creates a collection holding a single error.
    #[must_use]
    pub fn of(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Returns true when no errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Appends an error to the collection.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends every error from another collection.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// Returns the first collected error, if any.
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Iterates over the collected errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns every error whose path starts with the provided prefix.
    #[must_use]
    pub fn at_prefix(&self, prefix: &PathContext) -> Self {
        Self {
            errors: self
                .errors
                .iter()
                .filter(|error| error.path().starts_with(prefix))
                .cloned()
                .collect(),
        }
    }

    /// Returns every error of the provided kind.
    #[must_use]
    pub fn of_kind(&self, kind: ErrorKind) -> Self {
        Self {
            errors: self.errors.iter().filter(|error| error.kind() == kind).cloned().collect(),
        }
    }

    /// Converts the collection into a success-or-failure result.
    ///
    /// # Errors
    ///
    /// Returns the collection itself when it is non-empty.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Renders the collection as a JSON array in the requested path format.
    #[must_use]
    pub fn to_json(&self, format: PathFormat) -> Value {
        Value::Array(self.errors.iter().map(|error| error.to_json(format)).collect())
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl IntoIterator for ErrorCollection {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<ValidationError> for ErrorCollection {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}
