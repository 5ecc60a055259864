// crates/fieldgate-core/src/core/mod.rs
// ============================================================================
// Module: Fieldgate Core Types
// Description: Paths, errors, rule chains, and the dependency graph.
// Purpose: Provide the immutable building blocks consumed by the runtime.
// Dependencies: crate::interfaces, serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define the data model of validation: path contexts and their
//! serializers, the closed error taxonomy, persistent rule-set chains, and
//! the conditional dependency graph. All of them are immutable after
//! construction and safe to share across concurrent validation runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod error;
pub mod graph;
pub mod path;
pub mod ruleset;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ErrorCollection;
pub use error::ErrorKind;
pub use error::ValidationError;
pub use graph::CompositionError;
pub use graph::DependencyTracker;
pub use path::PathContext;
pub use path::PathFormat;
pub use path::Segment;
pub use ruleset::RuleSet;
