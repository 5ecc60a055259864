// crates/fieldgate-core/src/lib.rs
// ============================================================================
// Module: Fieldgate Core
// Description: Core types and runtime for concurrent structured validation.
// Purpose: Define rule sets, paths, errors, and the concurrent evaluator.
// Dependencies: serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Core crate of the fieldgate validation engine. It provides:
//!
//! - [`core::RuleSet`]: immutable, persistent rule chains with conditional
//!   registrations and cycle-checked dependency tracking.
//! - [`core::PathContext`] and [`core::PathFormat`]: structural locations in
//!   nested data and their serialized forms.
//! - [`core::ValidationError`] and [`core::ErrorCollection`]: the error
//!   model shared by every rule and the evaluator.
//! - [`runtime::evaluate`]: the concurrent, dependency-aware object
//!   evaluator with cancellation and deadline support.
//! - [`interfaces::Rule`] and [`interfaces::Condition`]: the seams user
//!   rules and gates plug into.
//!
//! Rule implementations for common constraints live in the companion
//! `fieldgate-rules` crate.

/// Core data model: paths, errors, dependency graph, and rule sets.
pub mod core;
/// Extension traits implemented by rules and conditions.
pub mod interfaces;
/// Concurrent evaluation runtime.
pub mod runtime;

pub use crate::core::CompositionError;
pub use crate::core::DependencyTracker;
pub use crate::core::ErrorCollection;
pub use crate::core::ErrorKind;
pub use crate::core::PathContext;
pub use crate::core::PathFormat;
pub use crate::core::RuleSet;
pub use crate::core::Segment;
pub use crate::core::ValidationError;
pub use crate::interfaces::Condition;
pub use crate::interfaces::FnRule;
pub use crate::interfaces::Rule;
pub use crate::runtime::EvalContext;
pub use crate::runtime::EvalHandle;
pub use crate::runtime::OutputShape;
pub use crate::runtime::evaluate;
pub use crate::runtime::evaluate_shaped;
