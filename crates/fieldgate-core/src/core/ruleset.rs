// crates/fieldgate-core/src/core/ruleset.rs
// ============================================================================
// Module: Fieldgate Rule Sets
// Description: Immutable, persistent chains of rules and keyed bindings.
// Purpose: Compose validation rules append-only with structural sharing.
// Dependencies: crate::core::graph, crate::interfaces, std
// ============================================================================

//! ## Overview
//! A [`RuleSet`] is a cheaply clonable handle over an immutable, parent-linked
//! chain of composition nodes. Every `with`-style operation returns a new
//! head; published nodes are never mutated, so arbitrarily many concurrent
//! validation runs can share one chain. Conditional registrations record
//! dependency edges in a [`DependencyTracker`] that is deep-copied on write,
//! keeping sibling rule sets isolated from each other's graphs.
//!
//! Effective rule collection applies conflict pruning: the most recently
//! added rule of a conflicting category shadows earlier ones on the same
//! chain.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::graph::CompositionError;
use crate::core::graph::DependencyTracker;
use crate::interfaces::Condition;
use crate::interfaces::Rule;

// ============================================================================
// SECTION: Chain Nodes
// ============================================================================

/// What a keyed registration binds to.
#[derive(Clone)]
pub(crate) enum Binding {
    /// A single rule evaluated against the field value.
    Rule(Arc<dyn Rule>),
    /// A nested rule set evaluated recursively against the field value.
    Nested(RuleSet),
}

/// Keyed registration payload.
struct FieldNode {
    /// Field name the registration binds to.
    key: String,
    /// Bound rule or nested set; `None` for presence-only registrations.
    binding: Option<Binding>,
    /// Whether the field must be present in the input.
    required: bool,
    /// Optional gate evaluated against the whole object.
    condition: Option<Arc<Condition>>,
}

/// One composition operation on the chain.
enum NodeOp {
    /// Rule bound to the object as a whole.
    ObjectRule(Arc<dyn Rule>),
    /// Rule or nested set bound to a field.
    Field(FieldNode),
    /// Unknown input keys are tolerated.
    AllowUnknown,
    /// Rule set applied to values at unknown keys.
    UnknownValues(RuleSet),
}

/// Immutable chain node.
struct Node {
    /// Previous head, or `None` at the start of the chain.
    parent: Option<Arc<Node>>,
    /// Operation recorded by this node.
    op: NodeOp,
}

// ============================================================================
// SECTION: Rule Set Handle
// ============================================================================

/// Immutable, persistent chain of rules plus composition metadata.
///
/// # Invariants
/// - The chain is never mutated after construction; every composition
///   operation returns a new head node.
/// - The dependency graph stays acyclic; conditional registrations that
///   would close a cycle fail before the edge is durably added.
#[derive(Clone, Default)]
pub struct RuleSet {
    /// Chain head, or `None` for the empty set.
    head: Option<Arc<Node>>,
    /// Conditional dependency graph for this chain.
    deps: Arc<DependencyTracker>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node, producing a new head.
    fn push(&self, op: NodeOp) -> Self {
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                op,
            })),
            deps: Arc::clone(&self.deps),
        }
    }

    /// Binds a rule to the object as a whole.
    #[must_use]
    pub fn rule(&self, rule: impl Rule + 'static) -> Self {
        self.push(NodeOp::ObjectRule(Arc::new(rule)))
    }

    /// Binds a rule to an optional field.
    #[must_use]
    pub fn field(&self, key: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.push(NodeOp::Field(FieldNode {
            key: key.into(),
            binding: Some(Binding::Rule(Arc::new(rule))),
            required: false,
            condition: None,
        }))
    }

    /// Binds a rule to a required field.
    #[must_use]
    pub fn required_field(&self, key: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.push(NodeOp::Field(FieldNode {
            key: key.into(),
            binding: Some(Binding::Rule(Arc::new(rule))),
            required: true,
            condition: None,
        }))
    }

    /// Marks a field required without binding a rule to it.
    #[must_use]
    pub fn required_key(&self, key: impl Into<String>) -> Self {
        self.push(NodeOp::Field(FieldNode {
            key: key.into(),
            binding: None,
            required: true,
            condition: None,
        }))
    }

    /// Binds a nested rule set to an optional field.
    #[must_use]
    pub fn nested(&self, key: impl Into<String>, set: Self) -> Self {
        self.push(NodeOp::Field(FieldNode {
            key: key.into(),
            binding: Some(Binding::Nested(set)),
            required: false,
            condition: None,
        }))
    }

    /// Binds a nested rule set to a required field.
    #[must_use]
    pub fn required_nested(&self, key: impl Into<String>, set: Self) -> Self {
        self.push(NodeOp::Field(FieldNode {
            key: key.into(),
            binding: Some(Binding::Nested(set)),
            required: true,
            condition: None,
        }))
    }

    /// Binds a rule to a field gated by a condition on other fields.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DependencyCycle`] when the condition's
    /// key set would close a dependency cycle.
    pub fn gated_field(
        &self,
        key: impl Into<String>,
        condition: Condition,
        rule: impl Rule + 'static,
    ) -> Result<Self, CompositionError> {
        self.gated(key.into(), condition, Some(Binding::Rule(Arc::new(rule))))
    }

    /// Binds a nested rule set to a field gated by a condition.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DependencyCycle`] when the condition's
    /// key set would close a dependency cycle.
    pub fn gated_nested(
        &self,
        key: impl Into<String>,
        condition: Condition,
        set: Self,
    ) -> Result<Self, CompositionError> {
        self.gated(key.into(), condition, Some(Binding::Nested(set)))
    }

    /// Records a gated registration and its dependency edges.
    fn gated(
        &self,
        key: String,
        condition: Condition,
        binding: Option<Binding>,
    ) -> Result<Self, CompositionError> {
        let mut deps = (*self.deps).clone();
        for depends_on in condition.keys() {
            deps.add(key.clone(), depends_on.clone())?;
        }
        let mut next = self.push(NodeOp::Field(FieldNode {
            key,
            binding,
            required: false,
            condition: Some(Arc::new(condition)),
        }));
        next.deps = Arc::new(deps);
        Ok(next)
    }

    /// Tolerates unknown input keys instead of reporting them.
    #[must_use]
    pub fn allow_unknown(&self) -> Self {
        self.push(NodeOp::AllowUnknown)
    }

    /// Applies a rule set to values found at unknown keys.
    #[must_use]
    pub fn unknown_values(&self, set: Self) -> Self {
        self.push(NodeOp::UnknownValues(set))
    }

    /// Returns the effective object-level rules after category pruning.
    #[must_use]
    pub fn rules(&self) -> Vec<Arc<dyn Rule>> {
        self.plan().object_rules
    }

    /// Returns the field names with at least one registration, in order.
    #[must_use]
    pub fn bound_keys(&self) -> Vec<String> {
        self.plan().fields.keys().cloned().collect()
    }

    /// Returns the dependency tracker for this chain.
    #[must_use]
    pub fn dependencies(&self) -> &DependencyTracker {
        &self.deps
    }

    /// Walks the chain once and extracts the evaluation plan.
    pub(crate) fn plan(&self) -> Plan {
        let mut ops = Vec::new();
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            ops.push(&node.op);
            cursor = node.parent.as_ref();
        }
        ops.reverse();

        let mut object_rules: Vec<Arc<dyn Rule>> = Vec::new();
        let mut fields: BTreeMap<String, FieldPlan> = BTreeMap::new();
        let mut allow_unknown = false;
        let mut unknown_values = None;

        for op in ops {
            match op {
                NodeOp::ObjectRule(rule) => object_rules.push(Arc::clone(rule)),
                NodeOp::Field(field) => {
                    let wait_on = field.condition.as_ref().map_or_else(Vec::new, |condition| {
                        transitive_wait_set(&self.deps, condition.keys())
                    });
                    let entry = fields.entry(field.key.clone()).or_default();
                    entry.required = entry.required || field.required;
                    entry.bindings.push(PlannedBinding {
                        binding: field.binding.clone(),
                        condition: field.condition.clone(),
                        wait_on,
                    });
                }
                NodeOp::AllowUnknown => allow_unknown = true,
                NodeOp::UnknownValues(set) => unknown_values = Some(set.clone()),
            }
        }

        for field in fields.values_mut() {
            field.bindings = prune_binding_categories(std::mem::take(&mut field.bindings));
        }

        Plan {
            object_rules: prune_categories(object_rules),
            fields,
            allow_unknown,
            unknown_values,
        }
    }
}

/// Keeps only the most recently added rule per conflicting category.
fn prune_categories(rules: Vec<Arc<dyn Rule>>) -> Vec<Arc<dyn Rule>> {
    let mut seen: BTreeSet<&'static str> = BTreeSet::new();
    let mut kept: Vec<Arc<dyn Rule>> = Vec::with_capacity(rules.len());
    for rule in rules.into_iter().rev() {
        match rule.category() {
            Some(category) => {
                if seen.insert(category) {
                    kept.push(rule);
                }
            }
            None => kept.push(rule),
        }
    }
    kept.reverse();
    kept
}

/// Keeps only the most recent same-category registration among a field's
/// bindings. Nested sets and presence-only registrations never conflict.
fn prune_binding_categories(bindings: Vec<PlannedBinding>) -> Vec<PlannedBinding> {
    let mut seen: BTreeSet<&'static str> = BTreeSet::new();
    let mut kept: Vec<PlannedBinding> = Vec::with_capacity(bindings.len());
    for planned in bindings.into_iter().rev() {
        let category = match &planned.binding {
            Some(Binding::Rule(rule)) => rule.category(),
            Some(Binding::Nested(_)) | None => None,
        };
        match category {
            Some(category) => {
                if seen.insert(category) {
                    kept.push(planned);
                }
            }
            None => kept.push(planned),
        }
    }
    kept.reverse();
    kept
}

/// Computes the transitive counter wait-set for a condition's key set.
fn transitive_wait_set(deps: &DependencyTracker, keys: &[String]) -> Vec<String> {
    let mut out: BTreeSet<String> = BTreeSet::new();
    for key in keys {
        out.insert(key.clone());
        out.extend(deps.transitive(key));
    }
    out.into_iter().collect()
}

// ============================================================================
// SECTION: Evaluation Plan
// ============================================================================

/// One planned registration for a field.
#[derive(Clone)]
pub(crate) struct PlannedBinding {
    /// Bound rule or nested set; `None` for presence-only registrations.
    pub(crate) binding: Option<Binding>,
    /// Optional gate evaluated against the whole object.
    pub(crate) condition: Option<Arc<Condition>>,
    /// Precomputed transitive wait-set for the gate, empty when ungated.
    pub(crate) wait_on: Vec<String>,
}

/// Planned registrations for one field.
#[derive(Clone, Default)]
pub(crate) struct FieldPlan {
    /// Effective registrations in composition order after category pruning.
    pub(crate) bindings: Vec<PlannedBinding>,
    /// Whether any registration marked the field required.
    pub(crate) required: bool,
}

/// Result of walking a chain once.
#[derive(Clone)]
pub(crate) struct Plan {
    /// Effective object-level rules after category pruning.
    pub(crate) object_rules: Vec<Arc<dyn Rule>>,
    /// Per-field registrations keyed by field name.
    pub(crate) fields: BTreeMap<String, FieldPlan>,
    /// Whether unknown input keys are tolerated.
    pub(crate) allow_unknown: bool,
    /// Rule set applied to values at unknown keys, if configured.
    pub(crate) unknown_values: Option<RuleSet>,
}
