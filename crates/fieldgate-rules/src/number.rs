// crates/fieldgate-rules/src/number.rs
// ============================================================================
// Module: Numeric Range Rules
// Description: Decimal-aware lower and upper bound rules for JSON numbers.
// Purpose: Compare numeric field values without binary float drift.
// Dependencies: bigdecimal, fieldgate-core, serde_json
// ============================================================================

//! ## Overview
//! Range rules parse JSON numbers into [`BigDecimal`] through their stable
//! string representation, so `0.1` compares as the decimal `0.1` rather than
//! its nearest binary float. Non-numeric values fail with a coercion error;
//! values outside the bound fail with [`ErrorKind::BelowMinimum`] or
//! [`ErrorKind::AboveMaximum`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Number;
use serde_json::Value;

use fieldgate_core::ErrorCollection;
use fieldgate_core::ErrorKind;
use fieldgate_core::PathContext;
use fieldgate_core::Rule;
use fieldgate_core::ValidationError;

// ============================================================================
// SECTION: Bound Rules
// ============================================================================

/// Conflict category shared by lower-bound registrations.
const MINIMUM_CATEGORY: &str = "number.minimum";

/// Conflict category shared by upper-bound registrations.
const MAXIMUM_CATEGORY: &str = "number.maximum";

/// Requires a numeric value greater than or equal to the bound.
pub struct Minimum {
    /// Inclusive lower bound.
    bound: BigDecimal,
}

impl Minimum {
    /// Creates an inclusive lower-bound rule.
    #[must_use]
    pub fn new(bound: impl Into<BigDecimal>) -> Self {
        Self {
            bound: bound.into(),
        }
    }

    /// Parses the bound from a decimal string such as `"0.1"`.
    #[must_use]
    pub fn parse(bound: &str) -> Option<Self> {
        BigDecimal::from_str(bound).ok().map(|bound| Self {
            bound,
        })
    }
}

impl Rule for Minimum {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        let Some(decimal) = decimal_of(&value) else {
            return coercion_failure(path, &value);
        };
        if decimal < self.bound {
            let error = ValidationError::new(
                ErrorKind::BelowMinimum,
                format!("value {decimal} is below the minimum {}", self.bound),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(MINIMUM_CATEGORY)
    }
}

/// Requires a numeric value less than or equal to the bound.
pub struct Maximum {
    /// Inclusive upper bound.
    bound: BigDecimal,
}

impl Maximum {
    /// Creates an inclusive upper-bound rule.
    #[must_use]
    pub fn new(bound: impl Into<BigDecimal>) -> Self {
        Self {
            bound: bound.into(),
        }
    }

    /// Parses the bound from a decimal string such as `"99.5"`.
    #[must_use]
    pub fn parse(bound: &str) -> Option<Self> {
        BigDecimal::from_str(bound).ok().map(|bound| Self {
            bound,
        })
    }
}

impl Rule for Maximum {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        let Some(decimal) = decimal_of(&value) else {
            return coercion_failure(path, &value);
        };
        if decimal > self.bound {
            let error = ValidationError::new(
                ErrorKind::AboveMaximum,
                format!("value {decimal} is above the maximum {}", self.bound),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(MAXIMUM_CATEGORY)
    }
}

// ============================================================================
// SECTION: Decimal Helpers
// ============================================================================

/// Parses a numeric JSON value into `BigDecimal`, `None` otherwise.
fn decimal_of(value: &Value) -> Option<BigDecimal> {
    let Value::Number(number) = value else {
        return None;
    };
    decimal_from_number(number)
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
pub(crate) fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

/// Builds the coercion failure returned for non-numeric values.
fn coercion_failure(path: &PathContext, value: &Value) -> (Value, ErrorCollection) {
    let error = ValidationError::new(
        ErrorKind::Coercion,
        format!("expected a number, found {value}"),
        path.clone(),
    );
    (value.clone(), ErrorCollection::of(error))
}
