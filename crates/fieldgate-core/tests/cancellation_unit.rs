// crates/fieldgate-core/tests/cancellation_unit.rs
// ============================================================================
// Module: Cancellation Unit Tests
// Description: Validate cancellation and deadline behavior of evaluation.
// Purpose: Ensure runs drain cleanly and append exactly one terminal error.
// ============================================================================

//! Cancellation and timeout tests for the evaluator.

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

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use fieldgate_core::ErrorCollection;
use fieldgate_core::ErrorKind;
use fieldgate_core::EvalContext;
use fieldgate_core::FnRule;
use fieldgate_core::PathContext;
use fieldgate_core::RuleSet;
use fieldgate_core::evaluate;

/// Rule that tracks in-flight invocations while sleeping.
fn tracked_sleep(
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
) -> FnRule<impl Fn(&PathContext, Value) -> (Value, ErrorCollection) + Send + Sync> {
    FnRule::new(move |_path: &PathContext, value: Value| {
        in_flight.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(delay);
        in_flight.fetch_sub(1, Ordering::SeqCst);
        (value, ErrorCollection::new())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_appends_exactly_one_terminal_error() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let set = RuleSet::new()
        .field("a", tracked_sleep(Duration::from_millis(50), Arc::clone(&in_flight)))
        .field("b", tracked_sleep(Duration::from_millis(50), Arc::clone(&in_flight)));
    let (ctx, handle) = EvalContext::cancellable();
    let cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
    });
    let input = json!({ "a": 1, "b": 2 });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &ctx).await;
    cancel.await.unwrap();
    assert_eq!(errors.of_kind(ErrorKind::Cancelled).len(), 1);
    // Every in-flight task finished before the evaluator returned.
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deadline_expiry_reports_a_timeout() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let set = RuleSet::new()
        .field("slow", tracked_sleep(Duration::from_millis(80), Arc::clone(&in_flight)));
    let ctx = EvalContext::with_timeout(Duration::from_millis(10));
    let input = json!({ "slow": 1 });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &ctx).await;
    assert_eq!(errors.of_kind(ErrorKind::Timeout).len(), 1);
    assert_eq!(errors.of_kind(ErrorKind::Cancelled).len(), 0);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pre_cancelled_context_still_terminates_with_one_error() {
    let set = RuleSet::new().field("a", tracked_sleep(Duration::ZERO, Arc::new(AtomicUsize::new(0))));
    let (ctx, handle) = EvalContext::cancellable();
    handle.cancel();
    let input = json!({ "a": 1 });
    let (_output, errors) = evaluate(&set, &input, &PathContext::root(), &ctx).await;
    assert_eq!(errors.of_kind(ErrorKind::Cancelled).len(), 1);
}

#[tokio::test]
async fn late_cancellation_does_not_fail_a_finished_run() {
    let set = RuleSet::new().field("a", tracked_sleep(Duration::ZERO, Arc::new(AtomicUsize::new(0))));
    let (ctx, handle) = EvalContext::cancellable();
    let input = json!({ "a": 1 });
    let (output, errors) = evaluate(&set, &input, &PathContext::root(), &ctx).await;
    handle.cancel();
    assert!(errors.is_empty(), "unexpected errors: {errors}");
    assert_eq!(output, json!({ "a": 1 }));
}

#[tokio::test]
async fn unbounded_context_never_reports_cancellation() {
    let ctx = EvalContext::unbounded();
    assert!(!ctx.is_cancelled());
    let set = RuleSet::new().field("a", tracked_sleep(Duration::ZERO, Arc::new(AtomicUsize::new(0))));
    let (_output, errors) = evaluate(&set, &json!({ "a": 1 }), &PathContext::root(), &ctx).await;
    assert!(errors.is_empty(), "unexpected errors: {errors}");
}

#[tokio::test]
async fn expired_deadline_marks_the_context_cancelled() {
    let ctx = EvalContext::with_timeout(Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(ctx.is_cancelled());
    assert_eq!(ctx.terminal_kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn cancel_handle_flips_the_context() {
    let (ctx, handle) = EvalContext::cancellable();
    assert!(!ctx.is_cancelled());
    handle.cancel();
    assert!(ctx.is_cancelled());
    assert_eq!(ctx.terminal_kind(), ErrorKind::Cancelled);
}
