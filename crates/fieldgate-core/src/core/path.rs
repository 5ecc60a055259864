// crates/fieldgate-core/src/core/path.rs
// ============================================================================
// Module: Fieldgate Path Context
// Description: Immutable, parent-linked paths into nested data.
// Purpose: Locate values and errors within nested objects and arrays.
// Dependencies: serde, std
// ============================================================================

//! ## Overview
//! A [`PathContext`] is an immutable, parent-linked chain of [`Segment`]
//! values. Validation threads one context through every rule call and extends
//! it by producing a new head, so concurrent evaluation branches safely share
//! common prefixes without copying them.
//!
//! Serializers are stateless functions over the root-to-leaf segment
//! sequence; new formats can be added without touching the evaluator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Segments
// ============================================================================

/// One step into nested data: a named field or an array index.
///
/// # Invariants
/// - Segments are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Array index access.
    Index(usize),
    /// Named field access.
    Name(String),
}

impl Segment {
    /// Returns the field name when this is a name segment.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Returns the array index when this is an index segment.
    #[must_use]
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

// ============================================================================
// SECTION: Path Context
// ============================================================================

/// Interior node of a path chain.
#[derive(Debug)]
struct PathNode {
    /// Parent context, possibly the root.
    parent: PathContext,
    /// Segment appended at this node.
    segment: Segment,
}

/// Immutable, parent-linked path into nested data.
///
/// # Invariants
/// - Published chains are never mutated; extension creates a new head.
/// - Cloning is cheap and shares the underlying chain.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    /// Head node, or `None` for the root context.
    node: Option<Arc<PathNode>>,
}

impl PathContext {
    /// Returns the empty root context.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            node: None,
        }
    }

    /// Returns true when this is the root context.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.node.is_none()
    }

    /// Extends the path with a named field segment.
    #[must_use]
    pub fn child_name(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Name(name.into()))
    }

    /// Extends the path with an array index segment.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    /// Extends the path with the provided segment.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        Self {
            node: Some(Arc::new(PathNode {
                parent: self.clone(),
                segment,
            })),
        }
    }

    /// Returns the parent context, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.as_ref().map(|node| node.parent.clone())
    }

    /// Returns the leaf segment, or `None` at the root.
    #[must_use]
    pub fn segment(&self) -> Option<&Segment> {
        self.node.as_ref().map(|node| &node.segment)
    }

    /// Returns the root-to-leaf segment sequence.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        let mut cursor = self.node.as_ref();
        while let Some(node) = cursor {
            out.push(node.segment.clone());
            cursor = node.parent.node.as_ref();
        }
        out.reverse();
        out
    }

    /// Returns true when this path starts with the provided prefix.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        let own = self.segments();
        let pre = prefix.segments();
        own.len() >= pre.len() && own[..pre.len()] == pre[..]
    }

    /// Renders the path in the requested format.
    #[must_use]
    pub fn render(&self, format: PathFormat) -> String {
        let segments = self.segments();
        match format {
            PathFormat::Slash => render_slash(&segments),
            PathFormat::JsonPointer => render_json_pointer(&segments),
            PathFormat::JsonPath => render_json_path(&segments),
            PathFormat::Dot => render_dot(&segments),
        }
    }
}

impl PartialEq for PathContext {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for PathContext {}

impl fmt::Display for PathContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(PathFormat::Slash))
    }
}

// ============================================================================
// SECTION: Serializers
// ============================================================================

/// Path serialization formats exposed to callers.
///
/// # Invariants
/// - Variants are stable for programmatic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathFormat {
    /// Default slash-delimited form: `/a/0/b`.
    Slash,
    /// RFC 6901 JSON Pointer form with `~0`/`~1` escaping.
    JsonPointer,
    /// Bracket JSONPath form: `a[0].b`.
    JsonPath,
    /// Dot-notation form: `a.0.b`.
    Dot,
}

/// Renders the default slash-delimited form; the root renders as `/`.
fn render_slash(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&segment.to_string());
    }
    out
}

/// Renders an RFC 6901 JSON Pointer, escaping `~` and `/`.
fn render_json_pointer(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Name(name) => {
                out.push_str(&name.replace('~', "~0").replace('/', "~1"));
            }
            Segment::Index(index) => {
                out.push_str(&index.to_string());
            }
        }
    }
    out
}

/// Renders a bracket JSONPath form.
fn render_json_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Name(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Renders the dot-notation form.
fn render_dot(segments: &[Segment]) -> String {
    segments.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}
