//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `SITEVIEW_SNAP_RADIUS`, `SITEVIEW_MAX_RAY_LENGTH`, `SITEVIEW_AUTHOR`
//! 2. Project-local: `.siteview/config.toml`
//! 3. Global: `~/.siteview/config.toml`

use crate::{Result, SiteviewError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Surface projection tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Ascending distances along a ray at which the surface is sampled
    pub sample_distances: Vec<f32>,
    /// Samples beyond this length are skipped
    pub max_ray_length: f32,
    /// Maximum distance at which a point counts as "on" a surface
    pub snap_radius: f32,
    /// Distance of the fallback point when nothing is within radius
    pub synthetic_distance: f32,
    /// Triangles per BVH leaf
    pub bvh_leaf_size: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            sample_distances: vec![20.0, 50.0, 100.0, 150.0, 200.0],
            max_ray_length: 200.0,
            snap_radius: 12.0,
            synthetic_distance: 50.0,
            bvh_leaf_size: 4,
        }
    }
}

/// Mouse button identity, independent of any windowing crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Annotation gizmo tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GizmoConfig {
    /// Distance along the camera's forward ray at which a new gizmo spawns
    pub spawn_distance: f32,
    /// Model opacity while annotation mode is active
    pub model_opacity: f32,
    /// World units per screen pixel, per axis
    pub drag_scale: [f32; 3],
    /// Length of each axis hit proxy, in world units
    pub proxy_length: f32,
    /// Half-thickness of each axis hit proxy
    pub proxy_thickness: f32,
    /// Scale applied to the hovered axis arrow
    pub hover_scale: f32,
    /// Button that grabs an axis. Kept distinct from the orbit button.
    pub manipulation_button: PointerButton,
    /// Pass dragged positions through the surface resolver
    pub snap_to_surface: bool,
    /// Show a marker where the pointer ray meets the model
    pub surface_preview: bool,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            spawn_distance: 10.0,
            model_opacity: 0.3,
            drag_scale: [0.1, 0.1, 0.1],
            proxy_length: 1.5,
            proxy_thickness: 0.35,
            hover_scale: 1.25,
            manipulation_button: PointerButton::Secondary,
            snap_to_surface: false,
            surface_preview: true,
        }
    }
}

/// How tree nodes without an element id get their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeIdStrategy {
    /// A fresh id on every build (historical behavior)
    #[default]
    ProcessUnique,
    /// Derived from the parent id and the child's index; stable across rebuilds
    Positional,
}

/// Hierarchy construction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub node_ids: NodeIdStrategy,
    pub placeholder_name: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            node_ids: NodeIdStrategy::default(),
            placeholder_name: "Unnamed element".to_string(),
        }
    }
}

/// Comment defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentConfig {
    pub author: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            author: "local".to_string(),
        }
    }
}

/// On-disk layer: every field optional so layers can be overlaid
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    anchor: AnchorFile,
    #[serde(default)]
    gizmo: GizmoFile,
    #[serde(default)]
    hierarchy: HierarchyFile,
    #[serde(default)]
    comments: CommentFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnchorFile {
    sample_distances: Option<Vec<f32>>,
    max_ray_length: Option<f32>,
    snap_radius: Option<f32>,
    synthetic_distance: Option<f32>,
    bvh_leaf_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GizmoFile {
    spawn_distance: Option<f32>,
    model_opacity: Option<f32>,
    drag_scale: Option<[f32; 3]>,
    proxy_length: Option<f32>,
    proxy_thickness: Option<f32>,
    hover_scale: Option<f32>,
    manipulation_button: Option<PointerButton>,
    snap_to_surface: Option<bool>,
    surface_preview: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HierarchyFile {
    node_ids: Option<NodeIdStrategy>,
    placeholder_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CommentFile {
    author: Option<String>,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteviewConfig {
    pub anchor: AnchorConfig,
    pub gizmo: GizmoConfig,
    pub hierarchy: HierarchyConfig,
    pub comments: CommentConfig,
}

impl SiteviewConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = SiteviewConfig::default();

        // Layer 1: Global config (~/.siteview/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 2: Project-local config (.siteview/config.toml)
        let local_path = PathBuf::from(".siteview/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            config.merge(local);
        }

        // Layer 3: Environment variable overrides
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = SiteviewConfig::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string on top of the defaults, without env overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| SiteviewError::Config(format!("Failed to parse config: {}", e)))?;
        let mut config = SiteviewConfig::default();
        config.merge(file);
        config.validate()?;
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".siteview").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        log::debug!("Loading config layer {}", path.display());
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SiteviewError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge(&mut self, overlay: ConfigFile) {
        let a = overlay.anchor;
        if let Some(v) = a.sample_distances {
            self.anchor.sample_distances = v;
        }
        if let Some(v) = a.max_ray_length {
            self.anchor.max_ray_length = v;
        }
        if let Some(v) = a.snap_radius {
            self.anchor.snap_radius = v;
        }
        if let Some(v) = a.synthetic_distance {
            self.anchor.synthetic_distance = v;
        }
        if let Some(v) = a.bvh_leaf_size {
            self.anchor.bvh_leaf_size = v;
        }

        let g = overlay.gizmo;
        if let Some(v) = g.spawn_distance {
            self.gizmo.spawn_distance = v;
        }
        if let Some(v) = g.model_opacity {
            self.gizmo.model_opacity = v;
        }
        if let Some(v) = g.drag_scale {
            self.gizmo.drag_scale = v;
        }
        if let Some(v) = g.proxy_length {
            self.gizmo.proxy_length = v;
        }
        if let Some(v) = g.proxy_thickness {
            self.gizmo.proxy_thickness = v;
        }
        if let Some(v) = g.hover_scale {
            self.gizmo.hover_scale = v;
        }
        if let Some(v) = g.manipulation_button {
            self.gizmo.manipulation_button = v;
        }
        if let Some(v) = g.snap_to_surface {
            self.gizmo.snap_to_surface = v;
        }
        if let Some(v) = g.surface_preview {
            self.gizmo.surface_preview = v;
        }

        if let Some(v) = overlay.hierarchy.node_ids {
            self.hierarchy.node_ids = v;
        }
        if let Some(v) = overlay.hierarchy.placeholder_name {
            self.hierarchy.placeholder_name = v;
        }
        if let Some(v) = overlay.comments.author {
            self.comments.author = v;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("SITEVIEW_SNAP_RADIUS") {
            self.anchor.snap_radius = parse_env_f32("SITEVIEW_SNAP_RADIUS", &value)?;
            log::debug!("SITEVIEW_SNAP_RADIUS overrides snap radius: {}", self.anchor.snap_radius);
        }
        if let Ok(value) = std::env::var("SITEVIEW_MAX_RAY_LENGTH") {
            self.anchor.max_ray_length = parse_env_f32("SITEVIEW_MAX_RAY_LENGTH", &value)?;
            log::debug!("SITEVIEW_MAX_RAY_LENGTH overrides max ray length: {}", self.anchor.max_ray_length);
        }
        if let Ok(author) = std::env::var("SITEVIEW_AUTHOR") {
            log::debug!("SITEVIEW_AUTHOR overrides comment author");
            self.comments.author = author;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.anchor.snap_radius > 0.0) {
            return Err(SiteviewError::Config(format!(
                "anchor.snap_radius must be positive, got {}",
                self.anchor.snap_radius
            )));
        }
        if self.anchor.sample_distances.windows(2).any(|w| w[0] > w[1]) {
            return Err(SiteviewError::Config(
                "anchor.sample_distances must be ascending".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gizmo.model_opacity) {
            return Err(SiteviewError::Config(format!(
                "gizmo.model_opacity must be between 0 and 1, got {}",
                self.gizmo.model_opacity
            )));
        }
        // The primary button is reserved for camera orbit
        if self.gizmo.manipulation_button == PointerButton::Primary {
            return Err(SiteviewError::Config(
                "gizmo.manipulation_button cannot be the primary button".to_string(),
            ));
        }
        if self.anchor.bvh_leaf_size == 0 {
            return Err(SiteviewError::Config(
                "anchor.bvh_leaf_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env_f32(name: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .map_err(|e| SiteviewError::Config(format!("{} is not a number: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("siteview_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = SiteviewConfig::default();
        assert_eq!(
            config.anchor.sample_distances,
            vec![20.0, 50.0, 100.0, 150.0, 200.0]
        );
        assert_eq!(config.anchor.snap_radius, 12.0);
        assert_eq!(config.gizmo.spawn_distance, 10.0);
        assert_eq!(config.gizmo.model_opacity, 0.3);
        assert_eq!(config.gizmo.manipulation_button, PointerButton::Secondary);
        assert_eq!(config.hierarchy.node_ids, NodeIdStrategy::ProcessUnique);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = SiteviewConfig::from_toml_str(
            r#"
[gizmo]
drag_scale = [0.2, 0.1, 0.05]

[hierarchy]
node_ids = "positional"
"#,
        )
        .unwrap();

        assert_eq!(config.gizmo.drag_scale, [0.2, 0.1, 0.05]);
        assert_eq!(config.gizmo.spawn_distance, 10.0);
        assert_eq!(config.hierarchy.node_ids, NodeIdStrategy::Positional);
        assert_eq!(config.hierarchy.placeholder_name, "Unnamed element");
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_config(
            r#"
[anchor]
sample_distances = [5.0, 10.0]
max_ray_length = 10.0

[gizmo]
manipulation_button = "middle"
"#,
        );
        let config = SiteviewConfig::load_from_file(&path).unwrap();

        assert_eq!(config.anchor.sample_distances, vec![5.0, 10.0]);
        assert_eq!(config.anchor.max_ray_length, 10.0);
        assert_eq!(config.gizmo.manipulation_button, PointerButton::Middle);

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_rejects_descending_samples() {
        let result = SiteviewConfig::from_toml_str(
            r#"
[anchor]
sample_distances = [50.0, 20.0]
"#,
        );
        assert!(matches!(result, Err(SiteviewError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_opacity() {
        let result = SiteviewConfig::from_toml_str("[gizmo]\nmodel_opacity = 1.5\n");
        assert!(matches!(result, Err(SiteviewError::Config(_))));
    }

    #[test]
    fn test_rejects_primary_manipulation_button() {
        let result = SiteviewConfig::from_toml_str("[gizmo]\nmanipulation_button = \"primary\"\n");
        assert!(matches!(result, Err(SiteviewError::Config(_))));

        let config =
            SiteviewConfig::from_toml_str("[gizmo]\nmanipulation_button = \"secondary\"\n").unwrap();
        assert_eq!(config.gizmo.manipulation_button, PointerButton::Secondary);
    }

    #[test]
    fn test_malformed_file() {
        let result = SiteviewConfig::from_toml_str("[anchor\nsnap_radius = ");
        assert!(matches!(result, Err(SiteviewError::Config(_))));
    }
}
