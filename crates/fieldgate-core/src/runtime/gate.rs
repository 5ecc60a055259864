// crates/fieldgate-core/src/runtime/gate.rs
// ============================================================================
// Module: Fieldgate Condition Gates
// Description: Synchronous rule-set checks used as boolean gates.
// Purpose: Derive the pass/skip signal for conditional fields.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! A condition is a rule set re-used for its error-or-not signal only: the
//! gate passes exactly when a synchronous, non-mutating evaluation of the
//! set against the current output snapshot reports zero errors. Gate
//! failures never reach the final error collection. Unknown keys in the
//! snapshot are ignored; a required field missing from the snapshot fails
//! the gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::path::PathContext;
use crate::core::ruleset::Binding;
use crate::core::ruleset::RuleSet;

// ============================================================================
// SECTION: Gate Check
// ============================================================================

/// Returns true when the rule set reports zero errors against the value.
pub(crate) fn check(set: &RuleSet, path: &PathContext, value: &Value) -> bool {
    let plan = set.plan();
    let Value::Object(object) = value else {
        return false;
    };

    for (key, field) in &plan.fields {
        let Some(present) = object.get(key) else {
            if field.required {
                return false;
            }
            continue;
        };
        // Mutations thread through this field's registration sequence but
        // never escape the gate.
        let mut current = present.clone();
        let child = path.child_name(key.clone());
        for planned in &field.bindings {
            if let Some(condition) = &planned.condition
                && !check(condition.rule_set(), path, value)
            {
                continue;
            }
            match &planned.binding {
                None => {}
                Some(Binding::Rule(rule)) => {
                    let (next, errors) = rule.evaluate(&child, current);
                    if !errors.is_empty() {
                        return false;
                    }
                    current = next;
                }
                Some(Binding::Nested(nested)) => {
                    if !check(nested, &child, &current) {
                        return false;
                    }
                }
            }
        }
    }

    let mut whole = value.clone();
    for rule in &plan.object_rules {
        let (next, errors) = rule.evaluate(path, whole);
        if !errors.is_empty() {
            return false;
        }
        whole = next;
    }

    true
}
