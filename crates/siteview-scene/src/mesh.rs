//! Mesh and material data exposed by the engine

use serde::{Deserialize, Serialize};
use siteview_core::{Color, ElementId, Vec3};

/// A triangle mesh in world space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMesh {
    #[serde(default)]
    pub element_id: Option<ElementId>,
    pub positions: Vec<[f32; 3]>,
    /// Triangle indices into `positions`. May be empty for point data.
    #[serde(default)]
    pub indices: Vec<[u32; 3]>,
    #[serde(default)]
    pub material: Option<usize>,
}

impl SceneMesh {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<[u32; 3]>) -> Self {
        Self {
            element_id: None,
            positions,
            indices,
            material: None,
        }
    }

    pub fn with_element(mut self, id: ElementId) -> Self {
        self.element_id = Some(id);
        self
    }

    pub fn with_material(mut self, index: usize) -> Self {
        self.material = Some(index);
        self
    }

    pub fn vertex(&self, index: u32) -> Option<Vec3> {
        self.positions.get(index as usize).map(|p| Vec3::from_array(*p))
    }

    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.positions)
    }
}

/// Axis-aligned bounding box computed from vertex positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshBounds {
    /// Compute bounds from a set of vertex positions
    pub fn from_positions(positions: &[[f32; 3]]) -> Option<Self> {
        let first = *positions.first()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in positions.iter().skip(1) {
            for i in 0..3 {
                bounds.min[i] = bounds.min[i].min(p[i]);
                bounds.max[i] = bounds.max[i].max(p[i]);
            }
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        )
    }

    /// Merge with another bounds to get the union
    pub fn union(&self, other: &MeshBounds) -> MeshBounds {
        MeshBounds {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

/// A material shared by one or more meshes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMaterial {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub transparent: bool,
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for SceneMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_positions() {
        let b = MeshBounds::from_positions(&[[0.0, 1.0, 2.0], [-1.0, 5.0, 0.0], [3.0, 0.0, 1.0]])
            .unwrap();
        assert_eq!(b.min, [-1.0, 0.0, 0.0]);
        assert_eq!(b.max, [3.0, 5.0, 2.0]);
        assert_eq!(b.center(), Vec3::new(1.0, 2.5, 1.0));
    }

    #[test]
    fn test_bounds_empty() {
        assert!(MeshBounds::from_positions(&[]).is_none());
    }

    #[test]
    fn test_material_defaults_from_json() {
        let m: SceneMaterial = serde_json::from_str(r#"{ "name": "glass" }"#).unwrap();
        assert_eq!(m.opacity, 1.0);
        assert!(!m.transparent);
    }
}
