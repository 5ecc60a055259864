// crates/fieldgate-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Fieldgate Object Evaluator
// Description: Concurrent, dependency-aware evaluation of object rule sets.
// Purpose: Run field rules in parallel, gate conditional fields, and merge
//          results into one shared output without data races.
// Dependencies: crate::{core, interfaces, runtime}, tokio, serde_json
// ============================================================================

//! ## Overview
//! The evaluator is the single canonical execution path for validating an
//! object against a [`RuleSet`]. One task runs per field registration;
//! independent fields interleave freely, while a conditional field waits on
//! the synchronization counters of every field its gate transitively depends
//! on, so the gate always observes fully resolved values. Failures from all
//! tasks funnel through one aggregation channel that also watches the
//! evaluation context. Cancellation stops intake; the evaluator still drains
//! every in-flight task before appending exactly one terminal error.
//!
//! The output value is returned even on failure so callers can inspect
//! partially validated state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Map;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::core::error::ErrorCollection;
use crate::core::error::ErrorKind;
use crate::core::error::ValidationError;
use crate::core::path::PathContext;
use crate::core::ruleset::Binding;
use crate::core::ruleset::PlannedBinding;
use crate::core::ruleset::RuleSet;
use crate::interfaces::Condition;
use crate::interfaces::Rule;
use crate::runtime::context::EvalContext;
use crate::runtime::counter::CounterSet;
use crate::runtime::counter::FieldCounter;
use crate::runtime::gate;
use crate::runtime::output::OutputShape;
use crate::runtime::output::OutputWriter;

// ============================================================================
// SECTION: Public Entry Points
// ============================================================================

/// Validates an object-shaped value into an open map output.
pub async fn evaluate(
    set: &RuleSet,
    input: &Value,
    path: &PathContext,
    ctx: &EvalContext,
) -> (Value, ErrorCollection) {
    evaluate_boxed(set.clone(), input.clone(), OutputShape::Map, path.clone(), ctx.clone()).await
}

/// Validates an object-shaped value into the requested output shape.
pub async fn evaluate_shaped(
    set: &RuleSet,
    input: &Value,
    shape: &OutputShape,
    path: &PathContext,
    ctx: &EvalContext,
) -> (Value, ErrorCollection) {
    evaluate_boxed(set.clone(), input.clone(), shape.clone(), path.clone(), ctx.clone()).await
}

/// Boxed recursion point for nested rule sets.
fn evaluate_boxed(
    set: RuleSet,
    input: Value,
    shape: OutputShape,
    path: PathContext,
    ctx: EvalContext,
) -> Pin<Box<dyn Future<Output = (Value, ErrorCollection)> + Send>> {
    Box::pin(evaluate_inner(set, input, shape, path, ctx))
}

// ============================================================================
// SECTION: Evaluation State Machine
// ============================================================================

/// Runs the full evaluation state machine for one object.
async fn evaluate_inner(
    set: RuleSet,
    input: Value,
    shape: OutputShape,
    path: PathContext,
    ctx: EvalContext,
) -> (Value, ErrorCollection) {
    let plan = set.plan();
    let mut errors = ErrorCollection::new();

    let input_map = match input {
        Value::Object(map) => map,
        other => {
            errors.push(ValidationError::new(
                ErrorKind::Coercion,
                format!("expected an object, found {}", value_kind(&other)),
                path.clone(),
            ));
            return (shape.writer().into_value(), errors);
        }
    };

    let output = Arc::new(Mutex::new(shape.writer()));
    let counters = CounterSet::new(plan.fields.keys().cloned());

    // Pre-increment every present field's counter before any task runs so a
    // fast task can never observe a dependency counter at zero early.
    for (key, field) in &plan.fields {
        let Some(counter) = counters.get(key) else {
            continue;
        };
        if input_map.contains_key(key) {
            if let Err(err) = counter.add(field.bindings.len()) {
                errors.push(internal(&path.child_name(key.clone()), &err.to_string()));
            }
        } else {
            if field.required {
                errors.push(ValidationError::new(
                    ErrorKind::Required,
                    format!("field {key} is required"),
                    path.child_name(key.clone()),
                ));
            }
            if let Err(err) = counter.clear() {
                errors.push(internal(&path.child_name(key.clone()), &err.to_string()));
            }
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ErrorCollection>();
    let mut tasks: JoinSet<()> = JoinSet::new();

    for (key, field) in &plan.fields {
        let Some(value) = input_map.get(key) else {
            continue;
        };
        let Some(counter) = counters.get(key) else {
            continue;
        };
        for planned in &field.bindings {
            tasks.spawn(run_field_task(FieldTask {
                key: key.clone(),
                value: value.clone(),
                field_path: path.child_name(key.clone()),
                object_path: path.clone(),
                counter: Arc::clone(&counter),
                waits: resolve_waits(&counters, planned),
                binding: planned.binding.clone(),
                condition: planned.condition.clone(),
                output: Arc::clone(&output),
                ctx: ctx.clone(),
                errors: tx.clone(),
            }));
        }
    }
    drop(tx);

    if collect(&mut tasks, &mut rx, &ctx, &mut errors, &path).await {
        errors.push(terminal(&ctx, &path));
        return (finish(output, &path, &mut errors), errors);
    }

    if ctx.is_cancelled() {
        errors.push(terminal(&ctx, &path));
        return (finish(output, &path, &mut errors), errors);
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ErrorCollection>();
    let mut tasks: JoinSet<()> = JoinSet::new();
    for rule in &plan.object_rules {
        tasks.spawn(run_object_task(
            Arc::clone(rule),
            Arc::clone(&output),
            path.clone(),
            ctx.clone(),
            tx.clone(),
        ));
    }
    drop(tx);

    if collect(&mut tasks, &mut rx, &ctx, &mut errors, &path).await {
        errors.push(terminal(&ctx, &path));
        return (finish(output, &path, &mut errors), errors);
    }

    if !plan.allow_unknown {
        apply_unknown_keys(
            &plan.unknown_values,
            &plan.fields,
            &input_map,
            &output,
            &path,
            &mut errors,
        );
    }

    (finish(output, &path, &mut errors), errors)
}

/// Aggregates task errors while watching the cancellation signal, then
/// drains every spawned task; returns true when cancellation was observed.
async fn collect(
    tasks: &mut JoinSet<()>,
    rx: &mut mpsc::UnboundedReceiver<ErrorCollection>,
    ctx: &EvalContext,
    errors: &mut ErrorCollection,
    path: &PathContext,
) -> bool {
    let cancelled = loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(batch) => errors.merge(batch),
                None => break false,
            },
            () = ctx.cancelled() => break true,
        }
    };
    // Even after cancellation, wait for in-flight tasks to physically finish
    // so no write races the caller reading the final output.
    while let Some(result) = tasks.join_next().await {
        if result.is_err() {
            errors.push(internal(path, "evaluation task terminated abnormally"));
        }
    }
    cancelled
}

/// Extracts the final output value once every task has terminated.
fn finish(
    output: Arc<Mutex<OutputWriter>>,
    path: &PathContext,
    errors: &mut ErrorCollection,
) -> Value {
    match Arc::try_unwrap(output) {
        Ok(mutex) => match mutex.into_inner() {
            Ok(writer) => writer.into_value(),
            Err(poisoned) => poisoned.into_inner().into_value(),
        },
        Err(shared) => match shared.lock() {
            Ok(writer) => writer.snapshot(),
            Err(_) => {
                errors.push(internal(path, "output value mutex poisoned"));
                Value::Null
            }
        },
    }
}

// ============================================================================
// SECTION: Field Tasks
// ============================================================================

/// Everything one field-registration task needs, owned for spawning.
struct FieldTask {
    /// Field name being evaluated.
    key: String,
    /// Input value at the field, as received.
    value: Value,
    /// Path extended with this field's segment.
    field_path: PathContext,
    /// Path of the enclosing object, used for condition evaluation.
    object_path: PathContext,
    /// Counter for this field.
    counter: Arc<FieldCounter>,
    /// Counters of every field the gate transitively depends on.
    waits: Vec<Arc<FieldCounter>>,
    /// Bound rule or nested set; `None` for presence-only registrations.
    binding: Option<Binding>,
    /// Optional gate.
    condition: Option<Arc<Condition>>,
    /// Shared output value.
    output: Arc<Mutex<OutputWriter>>,
    /// Cancellation and deadline signal.
    ctx: EvalContext,
    /// Aggregation channel for failures.
    errors: mpsc::UnboundedSender<ErrorCollection>,
}

/// Maps a condition's wait-set onto the counters that exist for it.
fn resolve_waits(counters: &CounterSet, planned: &PlannedBinding) -> Vec<Arc<FieldCounter>> {
    planned.wait_on.iter().filter_map(|key| counters.get(key)).collect()
}

/// Runs one field registration: lock, gate, evaluate, write, release.
async fn run_field_task(task: FieldTask) {
    let guard = task.counter.acquire().await;
    let outcome = run_field_binding(&task).await;
    drop(guard);
    if let Err(err) = task.counter.release() {
        let _ = task.errors.send(ErrorCollection::of(internal(&task.field_path, &err.to_string())));
    }
    if let Some(batch) = outcome {
        let _ = task.errors.send(batch);
    }
}

/// Evaluates the gate and binding; returns failures to forward, if any.
async fn run_field_binding(task: &FieldTask) -> Option<ErrorCollection> {
    if task.ctx.is_cancelled() {
        return None;
    }

    if let Some(condition) = &task.condition {
        for dependency in &task.waits {
            if let Err(err) = dependency.wait().await {
                return Some(ErrorCollection::of(internal(&task.field_path, &err.to_string())));
            }
        }
        let snapshot = match task.output.lock() {
            Ok(writer) => writer.snapshot(),
            Err(_) => {
                return Some(ErrorCollection::of(internal(
                    &task.field_path,
                    "output value mutex poisoned",
                )));
            }
        };
        // Condition failures gate the rule without producing errors.
        if !gate::check(condition.rule_set(), &task.object_path, &snapshot) {
            return None;
        }
    }

    match &task.binding {
        None => None,
        Some(Binding::Rule(rule)) => {
            let (value, failures) = rule.evaluate(&task.field_path, task.value.clone());
            if !failures.is_empty() {
                return Some(failures);
            }
            if task.ctx.is_cancelled() {
                return None;
            }
            write_field(task, value)
        }
        Some(Binding::Nested(nested)) => {
            let (value, failures) = evaluate_boxed(
                nested.clone(),
                task.value.clone(),
                OutputShape::Map,
                task.field_path.clone(),
                task.ctx.clone(),
            )
            .await;
            if task.ctx.is_cancelled() {
                return (!failures.is_empty()).then_some(failures);
            }
            // Partial nested output is written back even on failure, matching
            // the top-level partial-output contract.
            if let Some(write_failure) = write_field(task, value) {
                let mut merged = failures;
                merged.merge(write_failure);
                return Some(merged);
            }
            (!failures.is_empty()).then_some(failures)
        }
    }
}

/// Writes a successful field result under the shared output lock.
fn write_field(task: &FieldTask, value: Value) -> Option<ErrorCollection> {
    let mut writer = match task.output.lock() {
        Ok(writer) => writer,
        Err(_) => {
            return Some(ErrorCollection::of(internal(
                &task.field_path,
                "output value mutex poisoned",
            )));
        }
    };
    writer
        .set(&task.key, value)
        .err()
        .map(|err| ErrorCollection::of(internal(&task.field_path, &err.to_string())))
}

// ============================================================================
// SECTION: Object Tasks
// ============================================================================

/// Runs one object-level rule atomically against the output snapshot.
async fn run_object_task(
    rule: Arc<dyn Rule>,
    output: Arc<Mutex<OutputWriter>>,
    path: PathContext,
    ctx: EvalContext,
    errors: mpsc::UnboundedSender<ErrorCollection>,
) {
    if ctx.is_cancelled() {
        return;
    }
    let failures = {
        let mut writer = match output.lock() {
            Ok(writer) => writer,
            Err(_) => {
                let _ = errors
                    .send(ErrorCollection::of(internal(&path, "output value mutex poisoned")));
                return;
            }
        };
        let (value, failures) = rule.evaluate(&path, writer.snapshot());
        if failures.is_empty() {
            if ctx.is_cancelled() {
                return;
            }
            match writer.replace(value) {
                Ok(()) => None,
                Err(err) => Some(ErrorCollection::of(internal(&path, &err.to_string()))),
            }
        } else {
            Some(failures)
        }
    };
    if let Some(batch) = failures {
        let _ = errors.send(batch);
    }
}

// ============================================================================
// SECTION: Unknown Keys
// ============================================================================

/// Reports or re-validates input keys that have no bound rule.
fn apply_unknown_keys(
    unknown_values: &Option<RuleSet>,
    fields: &std::collections::BTreeMap<String, crate::core::ruleset::FieldPlan>,
    input_map: &Map<String, Value>,
    output: &Arc<Mutex<OutputWriter>>,
    path: &PathContext,
    errors: &mut ErrorCollection,
) {
    for (key, value) in input_map {
        if fields.contains_key(key) {
            continue;
        }
        let key_path = path.child_name(key.clone());
        let Some(unknown) = unknown_values else {
            errors.push(ValidationError::new(
                ErrorKind::UnexpectedField,
                format!("field {key} is not expected"),
                key_path,
            ));
            continue;
        };
        let mut current = value.clone();
        let mut failed = false;
        for rule in unknown.rules() {
            let (next, failures) = rule.evaluate(&key_path, current);
            current = next;
            if !failures.is_empty() {
                errors.merge(failures);
                failed = true;
                break;
            }
        }
        if failed {
            continue;
        }
        match output.lock() {
            Ok(mut writer) => {
                if writer.set(key, current).is_err() {
                    errors.push(ValidationError::new(
                        ErrorKind::UnexpectedField,
                        format!("field {key} is not expected"),
                        key_path,
                    ));
                }
            }
            Err(_) => errors.push(internal(&key_path, "output value mutex poisoned")),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an internal-invariant error at the provided path.
fn internal(path: &PathContext, message: &str) -> ValidationError {
    ValidationError::new(ErrorKind::InternalInvariant, message.to_string(), path.clone())
}

/// Builds the single terminal error for a cancelled or expired run.
fn terminal(ctx: &EvalContext, path: &PathContext) -> ValidationError {
    let kind = ctx.terminal_kind();
    let message = match kind {
        ErrorKind::Timeout => "evaluation deadline exceeded",
        _ => "evaluation cancelled",
    };
    ValidationError::new(kind, message, path.clone())
}

/// Returns a short label for a JSON value's type.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
