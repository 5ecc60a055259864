// crates/fieldgate-core/tests/evaluator_unit.rs
// ============================================================================
// Module: Object Evaluator Unit Tests
// Description: Validate concurrent field evaluation end to end.
// Purpose: Ensure ordering, gating, unknown-key, and output guarantees hold.
// ============================================================================

//! Concurrent object evaluation tests.

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

use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use fieldgate_core::Condition;
use fieldgate_core::ErrorCollection;
use fieldgate_core::ErrorKind;
use fieldgate_core::EvalContext;
use fieldgate_core::FnRule;
use fieldgate_core::OutputShape;
use fieldgate_core::PathContext;
use fieldgate_core::PathFormat;
use fieldgate_core::RuleSet;
use fieldgate_core::ValidationError;
use fieldgate_core::evaluate;
use fieldgate_core::evaluate_shaped;

/// Rule that always succeeds and leaves the value untouched.
fn pass() -> FnRule<impl Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync> {
    FnRule::new(|_path: &PathContext, value: Value| (value, ErrorCollection::new()))
}

/// Rule that fails unless the value equals the expectation.
fn equals(
    expected: Value,
) -> FnRule<impl Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync> {
    FnRule::new(move |path: &PathContext, value: Value| {
        if value == expected {
            (value, ErrorCollection::new())
        } else {
            let error = ValidationError::new(
                ErrorKind::NotAllowed,
                format!("expected {expected}, found {value}"),
                path.clone(),
            );
            (value, ErrorCollection::of(error))
        }
    })
}

/// Rule that sleeps on a worker thread, then replaces the value.
fn slow_replace(
    delay: Duration,
    replacement: Value,
) -> FnRule<impl Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync> {
    FnRule::new(move |_path: &PathContext, _value: Value| {
        std::thread::sleep(delay);
        (replacement.clone(), ErrorCollection::new())
    })
}

#[tokio::test]
async fn valid_input_mirrors_into_output() {
    let set = RuleSet::new()
        .required_field("name", equals(json!("ada")))
        .field("age", pass());
    let input = json!({ "name": "ada", "age": 36 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "name": "ada", "age": 36 }));
}

#[tokio::test]
async fn non_object_input_fails_coercion() {
    let set = RuleSet::new().field("a", pass());
    let (output, errors) =
        evaluate(&set, &json!([1, 2, 3]), &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().unwrap().kind(), ErrorKind::Coercion);
    assert_eq!(output, json!({}));
}

#[tokio::test]
async fn required_field_missing_is_reported_at_its_path() {
    let set = RuleSet::new()
        .required_field("name", pass())
        .field("age", equals(json!(36)));
    let input = json!({ "age": 36 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    let error = errors.first().unwrap();
    assert_eq!(error.kind(), ErrorKind::Required);
    assert_eq!(error.path().render(PathFormat::Slash), "/name");
    // Present fields still validate and land in the output.
    assert_eq!(output, json!({ "age": 36 }));
}

#[tokio::test]
async fn failing_rule_reports_at_the_field_path() {
    let set = RuleSet::new().field("name", equals(json!("ada")));
    let input = json!({ "name": "grace" });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().unwrap().path().render(PathFormat::Slash), "/name");
    // Failed fields are withheld from the output.
    assert_eq!(output, json!({}));
}

#[tokio::test]
async fn unknown_key_is_reported() {
    let set = RuleSet::new().field("x", pass());
    let input = json!({ "x": 1, "y": 2 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    let error = errors.first().unwrap();
    assert_eq!(error.kind(), ErrorKind::UnexpectedField);
    assert_eq!(error.path().render(PathFormat::Slash), "/y");
    assert_eq!(output, json!({ "x": 1 }));
}

#[tokio::test]
async fn allow_unknown_suppresses_the_report() {
    let set = RuleSet::new().field("x", pass()).allow_unknown();
    let input = json!({ "x": 1, "y": 2 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty());
    assert_eq!(output, json!({ "x": 1 }));
}

#[tokio::test]
async fn unknown_values_rule_set_validates_extra_keys() {
    let unknown = RuleSet::new().rule(equals(json!(2)));
    let set = RuleSet::new().field("x", pass()).unknown_values(unknown);
    let input = json!({ "x": 1, "good": 2, "bad": 3 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().unwrap().path().render(PathFormat::Slash), "/bad");
    assert_eq!(output, json!({ "x": 1, "good": 2 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fields_lose_no_updates() {
    // Varies the per-field delays on every round so the task interleaving
    // differs between rounds and between runs.
    let mut seed = u64::from(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(1, |elapsed| elapsed.subsec_nanos()),
    ) | 1;
    for round in 0..24_u32 {
        let mut set = RuleSet::new();
        let mut input = serde_json::Map::new();
        for i in 0..12_u64 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let key = format!("f{i:02}");
            let delay = Duration::from_micros(seed % 3_000);
            set = set.field(&key, slow_replace(delay, json!(i * 2)));
            input.insert(key, json!(i));
        }
        let (output, errors) = evaluate(
            &set,
            &Value::Object(input),
            &PathContext::root(),
            &EvalContext::unbounded(),
        )
        .await;
        assert!(errors.is_empty(), "round {round}: unexpected errors: {errors}");
        let Value::Object(fields) = output else {
            panic!("round {round}: expected object output");
        };
        assert_eq!(fields.len(), 12, "round {round}");
        for i in 0..12_u64 {
            assert_eq!(
                fields.get(&format!("f{i:02}")),
                Some(&json!(i * 2)),
                "round {round}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_observes_resolved_dependency_values() {
    // The rule on "a" is slow and rewrites the raw input; the gate on "b"
    // must still see the rewritten value.
    let gate = RuleSet::new().required_field("a", equals(json!("ready")));
    let set = RuleSet::new()
        .field("a", slow_replace(Duration::from_millis(20), json!("ready")))
        .gated_field("b", Condition::new(gate), pass())
        .unwrap();
    let input = json!({ "a": "raw", "b": true });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "a": "ready", "b": true }));
}

#[tokio::test]
async fn failed_condition_skips_the_field_silently() {
    let gate = RuleSet::new().required_field("mode", equals(json!("strict")));
    let set = RuleSet::new()
        .field("mode", pass())
        .gated_field("limit", Condition::new(gate), equals(json!(0)))
        .unwrap();
    let input = json!({ "mode": "lenient", "limit": 99 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "mode": "lenient" }));
}

#[tokio::test]
async fn absent_dependency_fails_the_gate_without_blocking() {
    let gate = RuleSet::new().required_field("mode", pass());
    let set = RuleSet::new()
        .field("mode", pass())
        .gated_field("limit", Condition::new(gate), pass())
        .unwrap();
    let input = json!({ "limit": 1 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({}));
}

#[tokio::test]
async fn nested_errors_carry_prefixed_paths() {
    let child = RuleSet::new()
        .required_field("inner", equals(json!("ok")))
        .field("extra", pass());
    let set = RuleSet::new().nested("child", child);
    let input = json!({ "child": { "inner": "broken", "stray": 1 } });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    let paths: Vec<String> =
        errors.iter().map(|error| error.path().render(PathFormat::Slash)).collect();
    assert!(paths.contains(&"/child/inner".to_string()), "paths: {paths:?}");
    assert!(paths.contains(&"/child/stray".to_string()), "paths: {paths:?}");
    // Partial nested output is written back despite the failures.
    assert_eq!(output, json!({ "child": {} }));
}

#[tokio::test]
async fn error_collections_filter_by_path_prefix() {
    let child = RuleSet::new()
        .required_field("inner", equals(json!("ok")))
        .required_key("also");
    let set = RuleSet::new().nested("child", child).required_key("top");
    let input = json!({ "child": { "inner": "broken" } });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 3);

    let child_prefix = PathContext::root().child_name("child");
    let scoped = errors.at_prefix(&child_prefix);
    assert_eq!(scoped.len(), 2);
    for error in scoped.iter() {
        assert!(error.path().starts_with(&child_prefix), "path: {}", error.path());
    }
    // The root prefix matches everything; an unrelated prefix matches nothing.
    assert_eq!(errors.at_prefix(&PathContext::root()).len(), 3);
    assert_eq!(errors.at_prefix(&PathContext::root().child_name("other")).len(), 0);
}

#[tokio::test]
async fn nested_success_writes_the_child_object() {
    let child = RuleSet::new().required_field("inner", equals(json!("ok")));
    let set = RuleSet::new().required_nested("child", child);
    let input = json!({ "child": { "inner": "ok" } });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "child": { "inner": "ok" } }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn object_rules_observe_all_field_results() {
    let summarize = FnRule::new(|_path: &PathContext, value: Value| match value {
        Value::Object(mut fields) => {
            let total: i64 = fields.values().filter_map(Value::as_i64).sum();
            fields.insert("total".to_string(), json!(total));
            (Value::Object(fields), ErrorCollection::new())
        }
        other => (other, ErrorCollection::new()),
    });
    let set = RuleSet::new()
        .field("a", slow_replace(Duration::from_millis(10), json!(1)))
        .field("b", slow_replace(Duration::from_millis(2), json!(2)))
        .rule(summarize);
    let input = json!({ "a": 0, "b": 0 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "a": 1, "b": 2, "total": 3 }));
}

#[tokio::test]
async fn every_registration_for_a_field_runs() {
    let set = RuleSet::new()
        .field("code", equals(json!("x")))
        .field("code", equals(json!("y")));
    let input = json!({ "code": "z" });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.of_kind(ErrorKind::NotAllowed).len(), 2);
}

#[tokio::test]
async fn same_category_field_registrations_keep_only_the_latest() {
    let reject = |message: &'static str| {
        FnRule::with_category(
            move |path: &PathContext, value: Value| {
                let error =
                    ValidationError::new(ErrorKind::NotAllowed, message, path.clone());
                (value, ErrorCollection::of(error))
            },
            "bound",
        )
    };
    let set = RuleSet::new()
        .field("k", reject("first"))
        .field("k", reject("second"));
    let input = json!({ "k": 1 });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &EvalContext::unbounded()).await;
    assert_eq!(errors.len(), 1);
    let error = errors.first().unwrap();
    assert_eq!(error.kind(), ErrorKind::NotAllowed);
    assert_eq!(error.message(), "second");
    assert_eq!(error.path().render(PathFormat::Slash), "/k");
}

#[tokio::test]
async fn fields_shape_reports_declared_keys_as_null() {
    let set = RuleSet::new().field("a", pass()).field("b", pass());
    let shape = OutputShape::Fields(vec!["a".to_string(), "b".to_string()]);
    let input = json!({ "a": 1 });
    let (output, errors) =
        evaluate_shaped(&set, &input, &shape, &PathContext::root(), &EvalContext::unbounded()).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "a": 1, "b": null }));
}
