// crates/fieldgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fieldgate Interfaces
// Description: Rule and condition contracts consumed by the evaluator.
// Purpose: Define the trait surfaces through which rules plug into the engine.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Rules are pure functions from a path context and a value to a possibly
//! replaced value plus an error collection. They must be side-effect free
//! beyond their return value and safe to call concurrently with other rules.
//! A [`Condition`] pairs a rule set with its statically declared dependency
//! key set; the key set drives dependency-tracker edges and counter waits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::error::ErrorCollection;
use crate::core::path::PathContext;
use crate::core::ruleset::RuleSet;

// ============================================================================
// SECTION: Rule Trait
// ============================================================================

/// Validates or normalizes one value.
pub trait Rule: Send + Sync {
    /// Evaluates the rule, returning the (possibly replaced) value and any
    /// failures. An empty collection signals success.
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection);

    /// Conflict category for chain pruning; rules of the same category
    /// replace earlier registrations on the same chain. `None` never
    /// conflicts.
    fn category(&self) -> Option<&'static str> {
        None
    }
}

// ============================================================================
// SECTION: Closure Adapter
// ============================================================================

/// Lifts a plain function or closure into a [`Rule`].
pub struct FnRule<F> {
    /// Wrapped evaluation function.
    func: F,
    /// Optional conflict category.
    category: Option<&'static str>,
}

impl<F> FnRule<F>
where
    F: Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync,
{
    /// Wraps a function with no conflict category.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self {
            func,
            category: None,
        }
    }

    /// Wraps a function under the provided conflict category.
    #[must_use]
    pub const fn with_category(func: F, category: &'static str) -> Self {
        Self {
            func,
            category: Some(category),
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync,
{
    fn evaluate(&self, path: &PathContext, value: Value) -> (Value, ErrorCollection) {
        (self.func)(path, value)
    }

    fn category(&self) -> Option<&'static str> {
        self.category
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Gate for a conditional field: a rule set evaluated against the whole
/// object for its zero-errors signal, plus the statically declared set of
/// fields the gate reads.
///
/// # Invariants
/// - `keys` is fixed at construction and drives dependency-tracker edges.
/// - Condition failures gate evaluation and never surface as validation
///   errors.
#[derive(Clone)]
pub struct Condition {
    /// Rule set evaluated against the whole object.
    set: RuleSet,
    /// Fields the gate reads; evaluation waits for their resolution.
    keys: Vec<String>,
}

impl Condition {
    /// Creates a condition whose key set is derived from the rule set's
    /// bound fields.
    #[must_use]
    pub fn new(set: RuleSet) -> Self {
        let keys = set.bound_keys();
        Self {
            set,
            keys,
        }
    }

    /// Creates a condition with an explicitly declared key set.
    #[must_use]
    pub fn with_keys(set: RuleSet, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            set,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the statically declared dependency keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the gate rule set.
    #[must_use]
    pub const fn rule_set(&self) -> &RuleSet {
        &self.set
    }
}
