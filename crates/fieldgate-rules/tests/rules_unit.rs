// crates/fieldgate-rules/tests/rules_unit.rs
// ============================================================================
// Module: Rule Unit Tests
// Description: Validate text, numeric, membership, and coercion rules.
// Purpose: Pin boundary behavior and error kinds for every shipped rule.
// ============================================================================

//! Unit tests for the shipped rule implementations.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use fieldgate_core::ErrorKind;
use fieldgate_core::PathContext;
use fieldgate_core::Rule;
use fieldgate_rules::MaxLength;
use fieldgate_rules::Maximum;
use fieldgate_rules::MinLength;
use fieldgate_rules::Minimum;
use fieldgate_rules::NoneOf;
use fieldgate_rules::OneOf;
use fieldgate_rules::Pattern;
use fieldgate_rules::coerce;

/// Runs a rule at the root path and returns the single error kind, if any.
fn kind_of(rule: &dyn Rule, value: Value) -> Option<ErrorKind> {
    let (_value, errors) = rule.evaluate(&PathContext::root(), value);
    errors.first().map(fieldgate_core::ValidationError::kind)
}

#[test]
fn min_length_counts_characters() {
    let rule = MinLength::new(3);
    assert_eq!(kind_of(&rule, json!("abc")), None);
    assert_eq!(kind_of(&rule, json!("ab")), Some(ErrorKind::BelowMinimum));
    // Three scalar values, even though the byte count is larger.
    assert_eq!(kind_of(&rule, json!("日本語")), None);
    assert_eq!(kind_of(&rule, json!(123)), Some(ErrorKind::Coercion));
}

#[test]
fn max_length_counts_characters() {
    let rule = MaxLength::new(2);
    assert_eq!(kind_of(&rule, json!("ab")), None);
    assert_eq!(kind_of(&rule, json!("")), None);
    assert_eq!(kind_of(&rule, json!("abc")), Some(ErrorKind::AboveMaximum));
}

#[test]
fn pattern_mismatch_reports_its_kind() {
    let rule = Pattern::new("*@*.com");
    assert_eq!(kind_of(&rule, json!("a@b.com")), None);
    assert_eq!(kind_of(&rule, json!("a@b.org")), Some(ErrorKind::PatternMismatch));
    assert_eq!(kind_of(&rule, json!(null)), Some(ErrorKind::Coercion));
}

#[test]
fn minimum_is_inclusive() {
    let rule = Minimum::new(10);
    assert_eq!(kind_of(&rule, json!(10)), None);
    assert_eq!(kind_of(&rule, json!(11)), None);
    assert_eq!(kind_of(&rule, json!(9)), Some(ErrorKind::BelowMinimum));
    assert_eq!(kind_of(&rule, json!("10")), Some(ErrorKind::Coercion));
}

#[test]
fn maximum_is_inclusive() {
    let rule = Maximum::new(10);
    assert_eq!(kind_of(&rule, json!(10)), None);
    assert_eq!(kind_of(&rule, json!(11)), Some(ErrorKind::AboveMaximum));
}

#[test]
fn bounds_compare_as_decimals_not_floats() {
    // 0.1 + 0.2 drifts above 0.3 in binary floats; decimals hold exact.
    let rule = Maximum::parse("0.3").unwrap();
    assert_eq!(kind_of(&rule, json!(0.3)), None);
    assert_eq!(kind_of(&rule, json!(0.30)), None);
    assert_eq!(kind_of(&rule, json!(0.31)), Some(ErrorKind::AboveMaximum));

    let rule = Minimum::parse("99.999999999999999999").unwrap();
    assert_eq!(kind_of(&rule, json!(100)), None);
}

#[test]
fn one_of_rejects_outsiders() {
    let rule = OneOf::new([json!("red"), json!("green")]);
    assert_eq!(kind_of(&rule, json!("red")), None);
    assert_eq!(kind_of(&rule, json!("blue")), Some(ErrorKind::NotAllowed));
}

#[test]
fn membership_is_decimal_aware() {
    let allow = OneOf::new([json!(1)]);
    assert_eq!(kind_of(&allow, json!(1.0)), None);
    let deny = NoneOf::new([json!(2.0)]);
    assert_eq!(kind_of(&deny, json!(2)), Some(ErrorKind::Forbidden));
}

#[test]
fn none_of_passes_everything_else() {
    let rule = NoneOf::new([json!("root"), json!("admin")]);
    assert_eq!(kind_of(&rule, json!("guest")), None);
    assert_eq!(kind_of(&rule, json!("admin")), Some(ErrorKind::Forbidden));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Account {
    name: String,
    age: u32,
}

#[test]
fn typed_structs_round_trip_through_the_map_shape() {
    let account = Account {
        name: "ada".to_string(),
        age: 36,
    };
    let path = PathContext::root();
    let value = coerce::from_shape(&account, &path).unwrap();
    assert_eq!(value, json!({ "name": "ada", "age": 36 }));
    let back: Account = coerce::to_shape(value, &path).unwrap();
    assert_eq!(back, account);
}

#[test]
fn malformed_input_fails_coercion_at_the_path() {
    let path = PathContext::root().child_name("payload");
    let err = coerce::from_str("{ not json", &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
    assert_eq!(err.path().to_string(), "/payload");

    let err = coerce::from_slice(b"\xff\xfe", &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
}

#[test]
fn mismatched_shapes_fail_coercion() {
    let path = PathContext::root();
    let err = coerce::to_shape::<Account>(json!({ "name": "ada" }), &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
}
