// crates/fieldgate-rules/src/lib.rs
// ============================================================================
// Module: Fieldgate Rules
// Description: Concrete validation rules and coercion helpers.
// Purpose: Provide the type-level rules composed into fieldgate rule sets.
// Dependencies: bigdecimal, fieldgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Companion crate to `fieldgate-core` with ready-made [`Rule`]
//! implementations:
//!
//! - [`text`]: string length bounds and wildcard pattern matching.
//! - [`number`]: decimal-aware numeric range bounds.
//! - [`set`]: allow-list and deny-list membership.
//! - [`coerce`]: serde bridges between raw input, typed structs, and the
//!   map-shaped values the evaluator consumes.
//!
//! Each rule carries a conflict category, so re-registering the same kind of
//! constraint on one chain shadows the earlier registration.
//!
//! [`Rule`]: fieldgate_core::Rule

/// Serde bridges between raw input and map-shaped values.
pub mod coerce;
/// Decimal-aware numeric range rules.
pub mod number;
/// Set membership rules.
pub mod set;
/// String length and pattern rules.
pub mod text;

pub use number::Maximum;
pub use number::Minimum;
pub use set::NoneOf;
pub use set::OneOf;
pub use text::MaxLength;
pub use text::MinLength;
pub use text::Pattern;
