//! CLI command implementations

pub mod comment;
pub mod config;
pub mod project;
pub mod tree;
pub mod visibility;

use anyhow::{Context, Result};
use siteview_core::{NodeIdStrategy, SiteviewConfig};
use siteview_scene::MemoryEngine;
use siteview_viewer::ModelViewer;

/// Effective config, optionally switched to positional node ids
pub(crate) fn load_config(positional_ids: bool) -> Result<SiteviewConfig> {
    let mut config = SiteviewConfig::load().context("Failed to load configuration")?;
    if positional_ids {
        config.hierarchy.node_ids = NodeIdStrategy::Positional;
    }
    Ok(config)
}

/// Import a scene document through the viewer's background loader
pub(crate) fn open_scene(path: &str, config: SiteviewConfig) -> Result<ModelViewer<MemoryEngine>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read scene: {}", path))?;

    let mut viewer = ModelViewer::new(config);
    viewer.begin_import(bytes, |bytes| MemoryEngine::from_json(&bytes));
    match viewer.wait_import() {
        Some(result) => result.with_context(|| format!("Failed to import scene: {}", path))?,
        None => anyhow::bail!("Import of {} never started", path),
    }
    Ok(viewer)
}
