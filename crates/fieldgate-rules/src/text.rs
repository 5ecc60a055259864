// crates/fieldgate-rules/src/text.rs
// ============================================================================
// Module: Text Rules
// Description: Length bounds and wildcard pattern matching for strings.
// Purpose: Validate string field values by character count and shape.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! ## Overview
//! Text rules operate on string values; anything else fails with a coercion
//! error. Lengths count Unicode scalar values, not bytes. Patterns use
//! wildcard syntax: `*` matches any run of characters including the empty
//! run, `?` matches exactly one character, and every other character matches
//! itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use fieldgate_core::ErrorCollection;
use fieldgate_core::ErrorKind;
use fieldgate_core::PathContext;
use fieldgate_core::Rule;
use fieldgate_core::ValidationError;

// ============================================================================
// SECTION: Length Rules
// ============================================================================

/// Conflict category shared by minimum-length registrations.
const MIN_LENGTH_CATEGORY: &str = "text.min_length";

/// Conflict category shared by maximum-length registrations.
const MAX_LENGTH_CATEGORY: &str = "text.max_length";

/// Conflict category shared by pattern registrations.
const PATTERN_CATEGORY: &str = "text.pattern";

/// Requires a string of at least `min` characters.
pub struct MinLength {
    /// Inclusive minimum character count.
    min: usize,
}

impl MinLength {
    /// Creates an inclusive minimum-length rule.
    #[must_use]
    pub const fn new(min: usize) -> Self {
        Self {
            min,
        }
    }
}

impl Rule for MinLength {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        let Value::String(text) = &value else {
            return coercion_failure(path, &value);
        };
        let length = text.chars().count();
        if length < self.min {
            let error = ValidationError::new(
                ErrorKind::BelowMinimum,
                format!("length {length} is below the minimum {}", self.min),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(MIN_LENGTH_CATEGORY)
    }
}

/// Requires a string of at most `max` characters.
pub struct MaxLength {
    /// Inclusive maximum character count.
    max: usize,
}

impl MaxLength {
    /// Creates an inclusive maximum-length rule.
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self {
            max,
        }
    }
}

impl Rule for MaxLength {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        let Value::String(text) = &value else {
            return coercion_failure(path, &value);
        };
        let length = text.chars().count();
        if length > self.max {
            let error = ValidationError::new(
                ErrorKind::AboveMaximum,
                format!("length {length} is above the maximum {}", self.max),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(MAX_LENGTH_CATEGORY)
    }
}

// ============================================================================
// SECTION: Pattern Rule
// ============================================================================

/// Requires a string matching a wildcard pattern.
pub struct Pattern {
    /// Wildcard pattern with `*` and `?` metacharacters.
    pattern: String,
}

impl Pattern {
    /// Creates a wildcard pattern rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Rule for Pattern {
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        let Value::String(text) = &value else {
            return coercion_failure(path, &value);
        };
        if !wildcard_match(&self.pattern, text) {
            let error = ValidationError::new(
                ErrorKind::PatternMismatch,
                format!("value does not match pattern {}", self.pattern),
                path.clone(),
            );
            return (value, ErrorCollection::of(error));
        }
        (value, ErrorCollection::new())
    }

    fn category(&self) -> Option<&'static str> {
        Some(PATTERN_CATEGORY)
    }
}

/// Matches text against a wildcard pattern in linear passes with
/// backtracking to the most recent `*`.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if let Some(star_p) = star {
            p = star_p + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the coercion failure returned for non-string values.
fn coercion_failure(path: &PathContext, value: &Value) -> (Value, ErrorCollection) {
    let error = ValidationError::new(
        ErrorKind::Coercion,
        format!("expected a string, found {value}"),
        path.clone(),
    );
    (value.clone(), ErrorCollection::of(error))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
