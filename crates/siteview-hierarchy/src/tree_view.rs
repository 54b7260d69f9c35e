//! Flattened rows for a collapsible tree panel

use crate::tree::{NodeIndex, SpatialTree};
use siteview_core::NodeId;
use std::collections::HashSet;

/// One visible row of the tree panel
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: usize,
    pub name: String,
    pub category: Option<String>,
    pub visible: bool,
    pub expanded: bool,
    pub has_children: bool,
    pub element_count: usize,
}

/// View-model over a [`SpatialTree`]: expansion state lives on the nodes,
/// the filter lives here
#[derive(Debug, Default, Clone)]
pub struct TreeView {
    filter: String,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into().trim().to_lowercase();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn toggle_expanded(&self, tree: &mut SpatialTree, id: &NodeId) -> Option<bool> {
        tree.toggle_expanded(id)
    }

    pub fn set_all_expanded(&self, tree: &mut SpatialTree, expanded: bool) {
        tree.set_all_expanded(expanded);
    }

    /// Rows to draw, in display order.
    ///
    /// Without a filter, collapsed branches hide their descendants. With a
    /// filter, matches and their ancestors are shown and forced open.
    pub fn rows(&self, tree: &SpatialTree) -> Vec<TreeRow> {
        let shown = (!self.filter.is_empty()).then(|| self.matching_set(tree));
        let mut rows = Vec::new();
        self.push_rows(tree, tree.root(), 0, shown.as_ref(), &mut rows);
        rows
    }

    fn push_rows(
        &self,
        tree: &SpatialTree,
        index: NodeIndex,
        depth: usize,
        shown: Option<&HashSet<NodeIndex>>,
        rows: &mut Vec<TreeRow>,
    ) {
        if shown.map_or(false, |s| !s.contains(&index)) {
            return;
        }
        let node = tree.node(index);
        let expanded = node.expanded || shown.is_some();
        rows.push(TreeRow {
            id: node.id.clone(),
            depth,
            name: node.display_name.clone(),
            category: node.category.clone(),
            visible: node.visible,
            expanded,
            has_children: node.has_children(),
            element_count: node.element_ids.len(),
        });

        if expanded {
            for child in node.children() {
                self.push_rows(tree, *child, depth + 1, shown, rows);
            }
        }
    }

    /// Matching nodes plus all their ancestors
    fn matching_set(&self, tree: &SpatialTree) -> HashSet<NodeIndex> {
        let mut shown = HashSet::new();
        for (index, _) in tree.walk() {
            let node = tree.node(index);
            let hit = node.display_name.to_lowercase().contains(&self.filter)
                || node
                    .category
                    .as_ref()
                    .map_or(false, |c| c.to_lowercase().contains(&self.filter));
            if !hit {
                continue;
            }
            shown.insert(index);
            for ancestor in tree.ancestors(index) {
                if !shown.insert(ancestor) {
                    break;
                }
            }
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use siteview_core::ElementId;

    fn sample() -> SpatialTree {
        let mut tree = SpatialTree::new(Node::new(NodeId::from("model"), "Project"));
        let root = tree.root();
        let storey = tree.push_child(root, Node::new(NodeId::from("s1"), "Level 1").with_category(Some("IFCBUILDINGSTOREY".into())));
        tree.push_child(storey, Node::new(NodeId::from("w"), "Outer wall").with_element(ElementId(1)));
        tree.push_child(storey, Node::new(NodeId::from("d"), "Front door").with_element(ElementId(2)));
        tree.push_child(root, Node::new(NodeId::from("s2"), "Level 2"));
        tree.recompute_aggregates();
        tree
    }

    fn names(rows: &[TreeRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_collapsed_by_default() {
        let tree = sample();
        let rows = TreeView::new().rows(&tree);
        assert_eq!(names(&rows), vec!["Project"]);
        assert!(rows[0].has_children);
        assert_eq!(rows[0].element_count, 2);
    }

    #[test]
    fn test_expand_all() {
        let mut tree = sample();
        let view = TreeView::new();
        view.set_all_expanded(&mut tree, true);
        let rows = view.rows(&tree);
        assert_eq!(names(&rows), vec!["Project", "Level 1", "Outer wall", "Front door", "Level 2"]);
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn test_toggle_single_branch() {
        let mut tree = sample();
        let view = TreeView::new();
        view.toggle_expanded(&mut tree, &NodeId::from("model"));
        assert_eq!(names(&view.rows(&tree)), vec!["Project", "Level 1", "Level 2"]);
    }

    #[test]
    fn test_filter_keeps_ancestors_open() {
        let tree = sample();
        let mut view = TreeView::new();
        view.set_filter("DOOR");
        let rows = view.rows(&tree);
        assert_eq!(names(&rows), vec!["Project", "Level 1", "Front door"]);
        assert!(rows.iter().all(|r| r.expanded));

        view.set_filter("storey");
        assert_eq!(names(&view.rows(&tree)), vec!["Project", "Level 1"]);

        view.clear_filter();
        assert_eq!(names(&view.rows(&tree)), vec!["Project"]);
    }
}
