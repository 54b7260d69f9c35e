//! Cascades a tree node's visibility to its elements

use crate::tree::SpatialTree;
use siteview_core::{ElementId, NodeId};
use siteview_scene::SceneEngine;

/// Applies node checkbox changes to the engine.
///
/// Uses the aggregate cached on each node at build time; nothing is
/// recomputed per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisibilityController;

impl VisibilityController {
    pub fn new() -> Self {
        Self
    }

    /// Set a node's visibility flag and push it to every element under it.
    ///
    /// Unknown nodes are ignored. A node with no elements only updates its
    /// flag. Otherwise the engine sees one bulk call and one render request.
    /// Returns true if the engine was touched.
    pub fn set_visible(
        &self,
        tree: &mut SpatialTree,
        engine: &mut dyn SceneEngine,
        node: &NodeId,
        visible: bool,
    ) -> bool {
        let Some(index) = tree.index_of(node) else {
            log::debug!("set_visible on unknown node {}", node);
            return false;
        };

        let entry = tree.node_mut(index);
        entry.visible = visible;
        if entry.element_ids.is_empty() {
            return false;
        }

        let ids: Vec<ElementId> = entry.element_ids.iter().copied().collect();
        engine.set_elements_visible(&ids, visible);
        engine.request_render();
        log::debug!("Node {} -> visible={} ({} elements)", node, visible, ids.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use serde_json::json;
    use siteview_core::NodeIdStrategy;
    use siteview_scene::{EngineCall, MemoryEngine};

    fn setup() -> (SpatialTree, MemoryEngine) {
        let doc = json!({
            "spatial_structure": {
                "localId": 1, "category": "IFCBUILDING",
                "children": [
                    { "localId": 2, "category": "IFCWALL" },
                    { "localId": 3, "category": "IFCSLAB" },
                    { "category": "IFCZONE" }
                ]
            },
            "element_children": { "2": [4, 5] }
        });
        let engine = MemoryEngine::from_json(doc.to_string().as_bytes()).unwrap();
        let tree = HierarchyBuilder::default()
            .with_node_ids(NodeIdStrategy::Positional)
            .build(&engine)
            .unwrap();
        (tree, engine)
    }

    #[test]
    fn test_hide_root_hides_everything() {
        let (mut tree, mut engine) = setup();
        let root = tree.root_node().id.clone();

        assert!(VisibilityController::new().set_visible(&mut tree, &mut engine, &root, false));
        for id in tree.root_node().element_ids.iter() {
            assert_eq!(engine.is_element_visible(*id), Some(false));
        }
        assert!(!tree.root_node().visible);
        assert_eq!(engine.render_requests(), 1);
    }

    #[test]
    fn test_leaf_toggle_is_local() {
        let (mut tree, mut engine) = setup();
        let controller = VisibilityController::new();
        let root = tree.root_node().id.clone();
        controller.set_visible(&mut tree, &mut engine, &root, false);

        controller.set_visible(&mut tree, &mut engine, &NodeId::from("model_1_3"), true);
        assert_eq!(engine.is_element_visible(siteview_core::ElementId(3)), Some(true));
        for raw in [1, 2, 4, 5] {
            assert_eq!(engine.is_element_visible(siteview_core::ElementId(raw)), Some(false));
        }
    }

    #[test]
    fn test_single_render_per_call() {
        let (mut tree, mut engine) = setup();
        let root = tree.root_node().id.clone();
        VisibilityController::new().set_visible(&mut tree, &mut engine, &root, false);
        assert_eq!(
            engine.journal(),
            &[EngineCall::SetVisible { count: 5, visible: false }, EngineCall::Render]
        );
    }

    #[test]
    fn test_unknown_and_empty_nodes() {
        let (mut tree, mut engine) = setup();
        let controller = VisibilityController::new();

        assert!(!controller.set_visible(&mut tree, &mut engine, &NodeId::from("nope"), false));
        assert!(!controller.set_visible(&mut tree, &mut engine, &NodeId::from("model_1_n2"), false));
        assert!(!tree.get(&NodeId::from("model_1_n2")).unwrap().visible);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let (mut tree, mut engine) = setup();
        let controller = VisibilityController::new();
        let wall = NodeId::from("model_1_2");
        controller.set_visible(&mut tree, &mut engine, &wall, false);
        controller.set_visible(&mut tree, &mut engine, &wall, false);
        assert_eq!(engine.is_element_visible(siteview_core::ElementId(4)), Some(false));
        assert_eq!(engine.is_element_visible(siteview_core::ElementId(1)), Some(true));
    }
}
