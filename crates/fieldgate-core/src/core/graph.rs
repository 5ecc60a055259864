// crates/fieldgate-core/src/core/graph.rs
// ============================================================================
// Module: Fieldgate Dependency Tracker
// Description: Directed field-dependency graph with cycle rejection.
// Purpose: Guarantee deadlock-free conditional gating at construction time.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! The tracker records "field A's conditional evaluation depends on field B"
//! edges while rule sets are composed. Insertion runs depth-first cycle
//! detection over the full edge set including the candidate edge and rejects
//! the edge before it is durably added, so a cyclic wait can never reach the
//! evaluator. Edges are only added during composition, never on the hot
//! validation path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

// ============================================================================
// SECTION: Composition Errors
// ============================================================================

/// Errors raised while composing rule sets.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - These errors indicate misconfigured rule wiring, never bad input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// Adding the edge would create a conditional dependency cycle.
    #[error("conditional dependency cycle introduced by edge {key} -> {depends_on}")]
    DependencyCycle {
        /// Field whose condition declares the dependency.
        key: String,
        /// Field the condition depends on.
        depends_on: String,
    },
}

// ============================================================================
// SECTION: Dependency Tracker
// ============================================================================

/// DFS visitation state used during cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    /// Node is on the current DFS stack.
    OnStack,
    /// Node and its descendants were fully explored.
    Done,
}

/// Directed graph of conditional field dependencies.
///
/// # Invariants
/// - The transitive closure of recorded edges is acyclic.
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    /// Adjacency map from a field to the fields it depends on.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// Registers a dependency edge after proving the graph stays acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DependencyCycle`] when the edge would
    /// close a cycle; the edge is not added in that case.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        depends_on: impl Into<String>,
    ) -> Result<(), CompositionError> {
        let key = key.into();
        let depends_on = depends_on.into();
        let inserted = self.edges.entry(key.clone()).or_default().insert(depends_on.clone());
        if self.has_cycle() {
            if inserted
                && let Some(deps) = self.edges.get_mut(&key)
            {
                deps.remove(&depends_on);
            }
            return Err(CompositionError::DependencyCycle {
                key,
                depends_on,
            });
        }
        Ok(())
    }

    /// Returns the direct dependencies recorded for a field.
    #[must_use]
    pub fn direct(&self, key: &str) -> BTreeSet<String> {
        self.edges.get(key).cloned().unwrap_or_default()
    }

    /// Returns the transitive dependency closure for a field.
    #[must_use]
    pub fn transitive(&self, key: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack: Vec<&str> = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(deps) = self.edges.get(current) {
                for dep in deps {
                    if out.insert(dep.clone()) {
                        stack.push(dep);
                    }
                }
            }
        }
        out
    }

    /// Returns true when the current edge set contains a cycle.
    fn has_cycle(&self) -> bool {
        let mut states: BTreeMap<&str, VisitState> = BTreeMap::new();
        for node in self.edges.keys() {
            if !states.contains_key(node.as_str()) && self.visit(node, &mut states) {
                return true;
            }
        }
        false
    }

    /// DFS visit with an on-stack marker; returns true when a cycle is found.
    fn visit<'a>(&'a self, node: &'a str, states: &mut BTreeMap<&'a str, VisitState>) -> bool {
        match states.get(node) {
            Some(VisitState::OnStack) => return true,
            Some(VisitState::Done) => return false,
            None => {}
        }
        states.insert(node, VisitState::OnStack);
        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                if self.visit(dep, states) {
                    return true;
                }
            }
        }
        states.insert(node, VisitState::Done);
        false
    }
}
