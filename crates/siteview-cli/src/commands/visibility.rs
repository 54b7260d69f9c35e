//! Hide/show a subtree

use super::{load_config, open_scene};
use anyhow::Result;
use siteview_core::NodeId;
use siteview_scene::SceneEngine;

pub fn run(scene: &str, node: &str, visible: bool, positional_ids: bool) -> Result<()> {
    let mut viewer = open_scene(scene, load_config(positional_ids)?)?;
    let node = NodeId::new(node);

    let Some(tree) = viewer.tree() else {
        anyhow::bail!("Scene has no spatial structure");
    };
    let Some(target) = tree.get(&node) else {
        anyhow::bail!("Node not found: {}", node);
    };
    let name = target.display_name.clone();
    let count = target.element_ids.len();

    if !viewer.set_node_visible(&node, visible) {
        println!("'{}' has no elements; only its flag changed.", name);
        return Ok(());
    }

    let verb = if visible { "Showing" } else { "Hiding" };
    println!("{} '{}' ({} elements)", verb, name, count);

    if let Some(engine) = viewer.engine() {
        let hidden: Vec<String> = engine
            .element_ids()
            .into_iter()
            .filter(|id| engine.is_element_visible(*id) == Some(false))
            .map(|id| id.to_string())
            .collect();
        println!("Hidden elements: {}", if hidden.is_empty() { "none".to_string() } else { hidden.join(", ") });
    }
    Ok(())
}
