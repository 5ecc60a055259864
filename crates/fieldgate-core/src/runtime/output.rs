// crates/fieldgate-core/src/runtime/output.rs
// ============================================================================
// Module: Fieldgate Output Writers
// Description: Tagged setter abstraction over the shared output value.
// Purpose: Give every task a uniform set/get surface for map- and
//          struct-shaped outputs without runtime reflection.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! The output value is the single mutable resource shared by all concurrent
//! per-field tasks. [`OutputWriter`] is a tagged variant selected once per
//! validated type: `Map` accepts any key, while `Fields` declares its field
//! names up front, starts them at `null`, and rejects undeclared writes.
//! Every read and write goes through one mutex held by the evaluator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Output Errors
// ============================================================================

/// Errors raised by output writers.
///
/// # Invariants
/// - Variants indicate programming errors in rule wiring, not data problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// A write targeted a field the declared shape does not contain.
    #[error("field {0} is not declared on the output shape")]
    UndeclaredField(String),
    /// A whole-object replacement was not object-shaped.
    #[error("replacement value is not an object")]
    NotAnObject,
}

// ============================================================================
// SECTION: Output Writer
// ============================================================================

/// Shared output value with a uniform keyed-write capability.
///
/// # Invariants
/// - `Fields` outputs only ever hold declared keys.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputWriter {
    /// Open map output; any key may be written.
    Map {
        /// Populated entries.
        values: Map<String, Value>,
    },
    /// Declared-shape output; undeclared writes are rejected.
    Fields {
        /// Declared field names.
        declared: BTreeSet<String>,
        /// Populated entries, null-initialized per declared field.
        values: Map<String, Value>,
    },
}

impl OutputWriter {
    /// Creates an empty open-map output.
    #[must_use]
    pub fn map() -> Self {
        Self::Map {
            values: Map::new(),
        }
    }

    /// Creates a declared-shape output with every field set to null.
    #[must_use]
    pub fn fields(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let declared: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let values = declared.iter().map(|name| (name.clone(), Value::Null)).collect();
        Self::Fields {
            declared,
            values,
        }
    }

    /// Writes a value at the provided key.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::UndeclaredField`] when a declared shape does
    /// not contain the key.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), OutputError> {
        match self {
            Self::Map {
                values,
            } => {
                values.insert(key.to_string(), value);
                Ok(())
            }
            Self::Fields {
                declared,
                values,
            } => {
                if !declared.contains(key) {
                    return Err(OutputError::UndeclaredField(key.to_string()));
                }
                values.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// Reads the value at the provided key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map {
                values,
            }
            | Self::Fields {
                values, ..
            } => values.get(key),
        }
    }

    /// Returns an object-shaped snapshot of the current output.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        match self {
            Self::Map {
                values,
            }
            | Self::Fields {
                values, ..
            } => Value::Object(values.clone()),
        }
    }

    /// Replaces the whole output with an object-shaped value.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::NotAnObject`] for non-object replacements and
    /// [`OutputError::UndeclaredField`] when a declared shape receives an
    /// undeclared key.
    pub fn replace(&mut self, value: Value) -> Result<(), OutputError> {
        let Value::Object(incoming) = value else {
            return Err(OutputError::NotAnObject);
        };
        match self {
            Self::Map {
                values,
            } => {
                *values = incoming;
                Ok(())
            }
            Self::Fields {
                declared,
                values,
            } => {
                if let Some(unknown) = incoming.keys().find(|key| !declared.contains(*key)) {
                    return Err(OutputError::UndeclaredField(unknown.clone()));
                }
                *values = incoming;
                Ok(())
            }
        }
    }

    /// Consumes the writer and returns the final output value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Map {
                values,
            }
            | Self::Fields {
                values, ..
            } => Value::Object(values),
        }
    }
}

// ============================================================================
// SECTION: Output Shape
// ============================================================================

/// Output shape selected once per validated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputShape {
    /// Open map output.
    Map,
    /// Declared-field output with the provided names.
    Fields(Vec<String>),
}

impl OutputShape {
    /// Allocates the writer for this shape.
    #[must_use]
    pub fn writer(&self) -> OutputWriter {
        match self {
            Self::Map => OutputWriter::map(),
            Self::Fields(names) => OutputWriter::fields(names.iter().cloned()),
        }
    }
}
