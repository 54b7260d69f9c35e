//! Builds the spatial tree from the engine's raw spatial structure

use crate::naming::{NameChain, NameQuery};
use crate::tree::{Node, NodeIndex, SpatialTree};
use siteview_core::{HierarchyConfig, NodeId, NodeIdStrategy};
use siteview_scene::{RawNode, SceneEngine};

/// Prefix every node id descends from
const ROOT_PREFIX: &str = "model";

pub struct HierarchyBuilder {
    names: NameChain,
    node_ids: NodeIdStrategy,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new(&HierarchyConfig::default())
    }
}

impl HierarchyBuilder {
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            names: NameChain::new(config.placeholder_name.clone()),
            node_ids: config.node_ids,
        }
    }

    pub fn with_names(mut self, names: NameChain) -> Self {
        self.names = names;
        self
    }

    pub fn with_node_ids(mut self, strategy: NodeIdStrategy) -> Self {
        self.node_ids = strategy;
        self
    }

    /// Build the tree for the engine's loaded model.
    ///
    /// Returns `None` when the engine has no spatial structure or it cannot
    /// be parsed; the model still renders without a tree.
    pub fn build(&self, engine: &dyn SceneEngine) -> Option<SpatialTree> {
        let Some(value) = engine.spatial_structure() else {
            log::info!("Model has no spatial structure; tree unavailable");
            return None;
        };
        match RawNode::from_value(&value) {
            Ok(root) => Some(self.build_from(&root, engine)),
            Err(e) => {
                log::warn!("Spatial structure unusable: {}", e);
                None
            }
        }
    }

    /// Build from an already-parsed raw root
    pub fn build_from(&self, root: &RawNode, engine: &dyn SceneEngine) -> SpatialTree {
        let root_id = match (root.element_id, self.node_ids) {
            (Some(element), _) => NodeId::for_element(ROOT_PREFIX, element),
            (None, NodeIdStrategy::Positional) => NodeId::new(ROOT_PREFIX),
            (None, NodeIdStrategy::ProcessUnique) => NodeId::process_unique(),
        };

        let mut tree = SpatialTree::new(self.make_node(root, root_id, engine));
        let root_index = tree.root();
        self.add_children(&mut tree, root_index, root, engine);
        tree.recompute_aggregates();

        log::info!(
            "Built spatial tree: {} nodes, {} elements",
            tree.len(),
            tree.root_node().element_ids.len()
        );
        tree
    }

    fn add_children(
        &self,
        tree: &mut SpatialTree,
        parent: NodeIndex,
        raw: &RawNode,
        engine: &dyn SceneEngine,
    ) {
        for (position, child) in raw.children.iter().enumerate() {
            let id = self.child_id(tree.node(parent).id.as_str(), child, position);
            let node = self.make_node(child, id, engine);
            let index = tree.push_child(parent, node);
            self.add_children(tree, index, child, engine);
        }
    }

    fn child_id(&self, parent: &str, raw: &RawNode, position: usize) -> NodeId {
        match (raw.element_id, self.node_ids) {
            (Some(element), _) => NodeId::for_element(parent, element),
            (None, NodeIdStrategy::Positional) => NodeId::positional(parent, position),
            (None, NodeIdStrategy::ProcessUnique) => NodeId::process_unique(),
        }
    }

    /// Resolve the name and the node's own element set. Lookup failures
    /// degrade to fallbacks and never abort the build.
    fn make_node(&self, raw: &RawNode, id: NodeId, engine: &dyn SceneEngine) -> Node {
        let name = self.names.resolve(&NameQuery::new(raw, engine));
        let mut node = Node::new(id, name).with_category(raw.category.clone());

        if let Some(element) = raw.element_id {
            node = node.with_element(element);
            match engine.items_children(&[element]) {
                Ok(children) => node.element_ids.extend(children),
                Err(e) => log::warn!("Structural children of element {} unavailable: {}", element, e),
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteview_core::ElementId;
    use siteview_scene::MemoryEngine;
    use std::collections::BTreeSet;

    fn engine() -> MemoryEngine {
        let doc = json!({
            "spatial_structure": {
                "localId": 1, "category": "IFCPROJECT", "Name": "Campus",
                "children": [
                    { "category": "IFCSITE", "children": [
                        { "localId": 10, "category": "IfcBuildingStorey", "children": [
                            { "localId": 11, "category": "IFCWALL" },
                            { "localId": 12, "category": "IFCWINDOW" }
                        ]}
                    ]}
                ]
            },
            "element_children": { "11": [20, 21], "1": [99] },
            "properties": {
                "12": [{ "name": "Pset_WindowCommon", "properties": [{ "name": "Name", "value": "Window W-3" }] }]
            }
        });
        MemoryEngine::from_json(doc.to_string().as_bytes()).unwrap()
    }

    fn set(raw: &[u64]) -> BTreeSet<ElementId> {
        raw.iter().map(|r| ElementId(*r)).collect()
    }

    #[test]
    fn test_build_names_and_ids() {
        let tree = HierarchyBuilder::default()
            .with_node_ids(NodeIdStrategy::Positional)
            .build(&engine())
            .unwrap();

        let root = tree.root_node();
        assert_eq!(root.id.as_str(), "model_1");
        assert_eq!(root.display_name, "Campus");

        let site = tree.get(&NodeId::from("model_1_n0")).unwrap();
        assert_eq!(site.display_name, "Site");
        assert_eq!(site.own_element_id, None);

        let storey = tree.get(&NodeId::from("model_1_n0_10")).unwrap();
        assert_eq!(storey.display_name, "Building Storey");

        let window = tree.get(&NodeId::from("model_1_n0_10_12")).unwrap();
        assert_eq!(window.display_name, "Window W-3");
    }

    #[test]
    fn test_structural_children_are_folded_in() {
        let tree = HierarchyBuilder::default()
            .with_node_ids(NodeIdStrategy::Positional)
            .build(&engine())
            .unwrap();

        assert_eq!(tree.element_ids(&NodeId::from("model_1_n0_10_11")).unwrap(), &set(&[11, 20, 21]));
        assert_eq!(tree.element_ids(&NodeId::from("model_1_n0_10")).unwrap(), &set(&[10, 11, 12, 20, 21]));
        assert_eq!(tree.root_node().element_ids, set(&[1, 10, 11, 12, 20, 21, 99]));
    }

    #[test]
    fn test_aggregate_is_superset_of_children() {
        let tree = HierarchyBuilder::default().build(&engine()).unwrap();
        for (index, _) in tree.walk() {
            let node = tree.node(index);
            if let Some(own) = node.own_element_id {
                assert!(node.element_ids.contains(&own));
            }
            for child in node.children() {
                assert!(node.element_ids.is_superset(&tree.node(*child).element_ids));
            }
        }
    }

    #[test]
    fn test_property_failure_does_not_abort() {
        let mut engine = engine();
        engine.fail_property_lookup(ElementId(12));
        let tree = HierarchyBuilder::default()
            .with_node_ids(NodeIdStrategy::Positional)
            .build(&engine)
            .unwrap();

        assert_eq!(tree.len(), 5);
        let window = tree.get(&NodeId::from("model_1_n0_10_12")).unwrap();
        assert_eq!(window.display_name, "Window");
    }

    #[test]
    fn test_missing_structure_yields_none() {
        assert!(HierarchyBuilder::default().build(&MemoryEngine::new()).is_none());

        let doc = json!({ "spatial_structure": "not a tree" });
        let engine = MemoryEngine::from_json(doc.to_string().as_bytes()).unwrap();
        assert!(HierarchyBuilder::default().build(&engine).is_none());
    }

    #[test]
    fn test_process_unique_ids_change_between_builds() {
        let engine = engine();
        let builder = HierarchyBuilder::default();
        let a = builder.build(&engine).unwrap();
        let b = builder.build(&engine).unwrap();

        assert_eq!(a.outline(), b.outline());
        let site_a = a.node(a.node(a.root()).children()[0]).id.clone();
        let site_b = b.node(b.node(b.root()).children()[0]).id.clone();
        assert_ne!(site_a, site_b);
    }

    #[test]
    fn test_positional_ids_are_stable() {
        let engine = engine();
        let builder = HierarchyBuilder::default().with_node_ids(NodeIdStrategy::Positional);
        let ids = |tree: &SpatialTree| -> Vec<NodeId> {
            tree.walk().into_iter().map(|(i, _)| tree.node(i).id.clone()).collect()
        };
        assert_eq!(ids(&builder.build(&engine).unwrap()), ids(&builder.build(&engine).unwrap()));
    }
}
