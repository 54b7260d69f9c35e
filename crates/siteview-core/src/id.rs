//! Identifiers for scene elements, tree nodes, and comments

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for process-unique node ids
static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

/// An opaque identifier into the scene engine's element table.
///
/// Owned by the engine; tree nodes and meshes only reference it.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl ElementId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a node in the spatial tree.
///
/// Derived as `parent + "_" + element` when the raw node carries an element
/// id; otherwise produced by the configured fallback strategy.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a node that carries an element id
    pub fn for_element(parent: &str, element: ElementId) -> Self {
        Self(format!("{}_{}", parent, element.0))
    }

    /// Positional fallback: stable for identical input
    pub fn positional(parent: &str, index: usize) -> Self {
        Self(format!("{}_n{}", parent, index))
    }

    /// Process-unique fallback: differs on every call
    pub fn process_unique() -> Self {
        let n = NEXT_NODE.fetch_add(1, Ordering::Relaxed);
        Self(format!("node-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a comment (UUID string, assigned locally on create)
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommentId({})", self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_id() {
        let id = NodeId::for_element("model", ElementId::new(42));
        assert_eq!(id.as_str(), "model_42");

        let child = NodeId::for_element(id.as_str(), ElementId::new(7));
        assert_eq!(child.as_str(), "model_42_7");
    }

    #[test]
    fn test_process_unique_ids_differ() {
        let a = NodeId::process_unique();
        let b = NodeId::process_unique();
        assert_ne!(a, b);
    }

    #[test]
    fn test_positional_ids_are_stable() {
        assert_eq!(NodeId::positional("model", 3), NodeId::positional("model", 3));
        assert_eq!(NodeId::positional("model", 3).as_str(), "model_n3");
    }
}
