// crates/fieldgate-rules/src/set.rs
// ============================================================================
// Module: Set Membership Rules
// Description: Allow-list and deny-list rules over JSON values.
// Purpose: Restrict field values to, or away from, an enumerated set.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! ## Overview
//! Membership rules compare candidate values against an enumerated set.
//! Numbers compare decimal-aware, so `1`, `1.0`, and `1.00` are the same
//! member; every other value type compares structurally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use fieldgate_core::ErrorCollection;
use fieldgate_core::ErrorKind;
use fieldgate_core::PathContext;
use fieldgate_core::Rule;
use fieldgate_core::ValidationError;

use crate::number::decimal_from_number;

// ============================================================================
// SECTION: Membership Rules
// ============================================================================

/// Conflict category shared by allow-list registrations.
const ONE_OF_CATEGORY: &str = "set.one_of";

/// Conflict category shared by deny-list registrations.
const NONE_OF_CATEGORY: &str = "set.none_of";

/// Requires the value to be one of the allowed members.
pub struct OneOf {
    /// Allowed members.
    allowed: Vec<Value>,
}

impl OneOf {
    /// Creates an allow-list rule from the given members.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = Value>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl Rule for OneOf {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        if self.allowed.iter().any(|member| values_equal(member, &value)) {
            return (value, ErrorCollection::new());
        }
        let error = ValidationError::new(
            ErrorKind::NotAllowed,
            format!("value {value} is not one of the allowed values"),
            path.clone(),
        );
        (value, ErrorCollection::of(error))
    }

    fn category(&self) -> Option<&'static str> {
        Some(ONE_OF_CATEGORY)
    }
}

/// Rejects the value when it matches a forbidden member.
pub struct NoneOf {
    /// Forbidden members.
    forbidden: Vec<Value>,
}

impl NoneOf {
    /// Creates a deny-list rule from the given members.
    #[must_use]
    pub fn new(forbidden: impl IntoIterator<Item = Value>) -> Self {
        Self {
            forbidden: forbidden.into_iter().collect(),
        }
    }
}

impl Rule for NoneOf {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        if self.forbidden.iter().any(|member| values_equal(member, &value)) {
            let error = ValidationError::new(
                ErrorKind::Forbidden,
                format!("value {value} is forbidden"),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(NONE_OF_CATEGORY)
    }
}

// ============================================================================
// SECTION: Equality
// ============================================================================

/// Structural equality with decimal-aware number comparison.
fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Value::Number(left), Value::Number(right)) = (left, right)
        && let (Some(left), Some(right)) = (decimal_from_number(left), decimal_from_number(right))
    {
        return left == right;
    }
    left == right
}
