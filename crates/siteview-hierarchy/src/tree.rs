//! Arena-backed spatial tree with cached element aggregates

use siteview_core::{ElementId, NodeId};
use std::collections::{BTreeSet, HashMap};

/// Position of a node in the tree's arena
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One node of the spatial tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub display_name: String,
    pub category: Option<String>,
    pub own_element_id: Option<ElementId>,
    /// Own element, its structural children, and every descendant's set.
    /// Cached; see [`SpatialTree::recompute_aggregates`].
    pub element_ids: BTreeSet<ElementId>,
    pub visible: bool,
    pub expanded: bool,
    children: Vec<NodeIndex>,
    parent: Option<NodeIndex>,
}

impl Node {
    pub fn new(id: NodeId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            category: None,
            own_element_id: None,
            element_ids: BTreeSet::new(),
            visible: true,
            expanded: false,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Set the node's own element; it joins `element_ids` too
    pub fn with_element(mut self, id: ElementId) -> Self {
        self.own_element_id = Some(id);
        self.element_ids.insert(id);
        self
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The built hierarchy.
///
/// Nodes live in a flat arena; children are stored as indices and the parent
/// link is a plain lookup key. A `NodeId` index gives O(1) access by id.
#[derive(Debug, Clone)]
pub struct SpatialTree {
    nodes: Vec<Node>,
    /// Elements contributed by each node before aggregation
    own_sets: Vec<BTreeSet<ElementId>>,
    by_id: HashMap<NodeId, NodeIndex>,
}

impl SpatialTree {
    pub fn new(mut root: Node) -> Self {
        root.parent = None;
        root.children.clear();
        let mut by_id = HashMap::new();
        by_id.insert(root.id.clone(), NodeIndex(0));
        Self {
            own_sets: vec![root.element_ids.clone()],
            nodes: vec![root],
            by_id,
        }
    }

    /// Append a child under `parent`. Aggregates are not refreshed until
    /// [`recompute_aggregates`](Self::recompute_aggregates) runs.
    pub fn push_child(&mut self, parent: NodeIndex, mut node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();

        if self.by_id.contains_key(&node.id) {
            log::warn!("Duplicate node id {} in spatial tree; keeping the first", node.id);
        } else {
            self.by_id.insert(node.id.clone(), index);
        }

        self.own_sets.push(node.element_ids.clone());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(index);
        index
    }

    /// Rebuild every node's `element_ids` bottom-up from the own sets
    pub fn recompute_aggregates(&mut self) {
        // Children always have larger indices than their parent, so a reverse
        // sweep visits every child before its parent.
        for i in 0..self.nodes.len() {
            self.nodes[i].element_ids = self.own_sets[i].clone();
        }
        for i in (1..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[i].parent {
                let child_set = std::mem::take(&mut self.nodes[i].element_ids);
                self.nodes[parent.0].element_ids.extend(child_set.iter().copied());
                self.nodes[i].element_ids = child_set;
            }
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0]
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i.0])
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        Some(&mut self.nodes[index.0])
    }

    /// Cached aggregate element ids of a node
    pub fn element_ids(&self, id: &NodeId) -> Option<&BTreeSet<ElementId>> {
        self.get(id).map(|n| &n.element_ids)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in depth-first pre-order, with their depth
    pub fn walk(&self) -> Vec<(NodeIndex, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), 0)];
        while let Some((index, depth)) = stack.pop() {
            out.push((index, depth));
            for child in self.nodes[index.0].children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.nodes[index.0].parent, move |i| self.nodes[i.0].parent)
    }

    /// Flip a node's expanded flag. Returns the new state, `None` for unknown ids.
    pub fn toggle_expanded(&mut self, id: &NodeId) -> Option<bool> {
        let node = self.get_mut(id)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        for node in &mut self.nodes {
            node.expanded = expanded;
        }
    }

    /// Names and shape without ids, for comparing two builds
    pub fn outline(&self) -> Vec<(usize, String)> {
        self.walk()
            .into_iter()
            .map(|(i, depth)| (depth, self.nodes[i.0].display_name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> BTreeSet<ElementId> {
        raw.iter().map(|r| ElementId(*r)).collect()
    }

    fn sample() -> SpatialTree {
        let mut tree = SpatialTree::new(Node::new(NodeId::from("model"), "Project"));
        let root = tree.root();
        let storey = tree.push_child(root, Node::new(NodeId::from("s"), "Storey").with_element(ElementId(2)));
        tree.push_child(storey, Node::new(NodeId::from("w"), "Wall").with_element(ElementId(3)));
        tree.push_child(storey, Node::new(NodeId::from("d"), "Door").with_element(ElementId(4)));
        tree.push_child(root, Node::new(NodeId::from("site"), "Site"));
        tree.recompute_aggregates();
        tree
    }

    #[test]
    fn test_aggregates_are_unions() {
        let tree = sample();
        assert_eq!(tree.root_node().element_ids, ids(&[2, 3, 4]));
        assert_eq!(tree.element_ids(&NodeId::from("s")).unwrap(), &ids(&[2, 3, 4]));
        assert_eq!(tree.element_ids(&NodeId::from("w")).unwrap(), &ids(&[3]));
        assert!(tree.element_ids(&NodeId::from("site")).unwrap().is_empty());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut tree = sample();
        let before = tree.root_node().element_ids.clone();
        tree.recompute_aggregates();
        assert_eq!(tree.root_node().element_ids, before);
        assert_eq!(tree.element_ids(&NodeId::from("d")).unwrap(), &ids(&[4]));
    }

    #[test]
    fn test_walk_and_ancestors() {
        let tree = sample();
        let names: Vec<_> = tree.outline().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Project", "Storey", "Wall", "Door", "Site"]);

        let door = tree.index_of(&NodeId::from("d")).unwrap();
        let chain: Vec<_> = tree.ancestors(door).map(|i| tree.node(i).display_name.clone()).collect();
        assert_eq!(chain, vec!["Storey", "Project"]);
    }

    #[test]
    fn test_toggle_expanded() {
        let mut tree = sample();
        assert_eq!(tree.toggle_expanded(&NodeId::from("s")), Some(true));
        assert_eq!(tree.toggle_expanded(&NodeId::from("s")), Some(false));
        assert_eq!(tree.toggle_expanded(&NodeId::from("missing")), None);
    }
}
