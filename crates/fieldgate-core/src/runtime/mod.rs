// crates/fieldgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Fieldgate Runtime
// Description: Concurrent evaluation runtime for rule sets.
// Purpose: Group the evaluator, synchronization, output, and context types.
// Dependencies: crate::core, crate::interfaces, tokio, serde_json
// ============================================================================

//! ## Overview
//! Runtime layer of the validation engine. [`evaluate`] and
//! [`evaluate_shaped`] drive the concurrent per-field task model; the
//! supporting types cover cancellation ([`EvalContext`], [`EvalHandle`]),
//! per-field synchronization ([`FieldCounter`], [`CounterSet`]), and the
//! shared output value ([`OutputWriter`], [`OutputShape`]).

/// Cancellation and deadline propagation for evaluation runs.
pub mod context;
/// Per-field synchronization counters.
pub mod counter;
/// Concurrent object evaluator.
pub mod evaluator;
/// Synchronous condition checking against output snapshots.
pub(crate) mod gate;
/// Shared output value construction.
pub mod output;

pub use context::EvalContext;
pub use context::EvalHandle;
pub use counter::CounterError;
pub use counter::CounterSet;
pub use counter::FieldCounter;
pub use evaluator::evaluate;
pub use evaluator::evaluate_shaped;
pub use output::OutputError;
pub use output::OutputShape;
pub use output::OutputWriter;
