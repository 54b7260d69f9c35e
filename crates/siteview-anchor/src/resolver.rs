//! Projects rays and points onto the loaded model's surfaces

use crate::bvh::Bvh;
use crate::geometry::Ray;
use siteview_core::{AnchorConfig, ElementId, Vec3};
use siteview_scene::SceneMesh;

/// Result of projecting a ray onto the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayProjection {
    /// A surface point within snap radius of one of the ray samples
    OnSurface(Vec3),
    /// Nothing was in range; a point on the ray at the fallback distance
    Synthetic(Vec3),
}

impl RayProjection {
    pub fn point(&self) -> Vec3 {
        match self {
            RayProjection::OnSurface(p) | RayProjection::Synthetic(p) => *p,
        }
    }

    pub fn is_on_surface(&self) -> bool {
        matches!(self, RayProjection::OnSurface(_))
    }
}

/// Closest surface point found for a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    /// Distance from the query point
    pub distance: f32,
    /// Index of the mesh in the set the resolver was built from
    pub mesh: usize,
    pub element: Option<ElementId>,
}

/// Per-mesh search structure
#[derive(Debug, Clone)]
enum MeshIndex {
    Bvh(Bvh),
    /// No usable triangles: nearest-vertex scan
    Vertices(Vec<Vec3>),
}

#[derive(Debug, Clone)]
struct IndexedMesh {
    element: Option<ElementId>,
    index: MeshIndex,
}

impl IndexedMesh {
    fn closest(&self, point: Vec3, radius: f32) -> Option<(Vec3, f32)> {
        match &self.index {
            MeshIndex::Bvh(bvh) => bvh.closest_point(point, radius),
            MeshIndex::Vertices(vertices) => vertices
                .iter()
                .map(|v| (*v, v.distance(&point)))
                .filter(|(_, d)| *d <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1)),
        }
    }
}

/// Surface queries against a snapshot of the loaded meshes.
///
/// Call [`rebuild`](Self::rebuild) whenever the engine's geometry changes.
/// Query cost is bounded by the sample list and the snap radius.
#[derive(Debug, Clone)]
pub struct SurfaceAnchorResolver {
    config: AnchorConfig,
    meshes: Vec<IndexedMesh>,
}

impl SurfaceAnchorResolver {
    /// A resolver with no geometry
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            config,
            meshes: Vec::new(),
        }
    }

    pub fn from_meshes(config: AnchorConfig, meshes: &[SceneMesh]) -> Self {
        let mut resolver = Self::new(config);
        resolver.rebuild(meshes);
        resolver
    }

    pub fn rebuild(&mut self, meshes: &[SceneMesh]) {
        let leaf_size = self.config.bvh_leaf_size;
        self.meshes = meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let index = match Bvh::build(mesh, leaf_size) {
                    Some(bvh) => MeshIndex::Bvh(bvh),
                    None => {
                        log::debug!(
                            "Mesh {} has no usable triangles; using vertex scan ({} vertices)",
                            i,
                            mesh.positions.len()
                        );
                        MeshIndex::Vertices(mesh.positions.iter().map(|p| Vec3::from_array(*p)).collect())
                    }
                };
                IndexedMesh {
                    element: mesh.element_id,
                    index,
                }
            })
            .collect();
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Meshes searched through a BVH rather than a vertex scan
    pub fn indexed_mesh_count(&self) -> usize {
        self.meshes
            .iter()
            .filter(|m| matches!(m.index, MeshIndex::Bvh(_)))
            .count()
    }

    /// The closest surface point to `point` across every mesh, within `radius`
    pub fn closest_surface_point(&self, point: Vec3, radius: f32) -> Option<SurfaceHit> {
        let mut best: Option<SurfaceHit> = None;
        for (i, mesh) in self.meshes.iter().enumerate() {
            let limit = best.map_or(radius, |b| b.distance);
            if let Some((p, d)) = mesh.closest(point, limit) {
                if best.map_or(true, |b| d < b.distance) {
                    best = Some(SurfaceHit {
                        point: p,
                        distance: d,
                        mesh: i,
                        element: mesh.element,
                    });
                }
            }
        }
        best
    }

    /// Project a ray onto the model.
    ///
    /// The ray is sampled at each configured distance up to the maximum ray
    /// length; the surface point closest to its own sample wins. Without any
    /// surface in range a synthetic point on the ray is returned. `None` only
    /// for a degenerate direction.
    pub fn project_ray_to_surface(&self, origin: Vec3, direction: Vec3) -> Option<RayProjection> {
        Ray::new(origin, direction).map(|ray| self.project_ray(&ray))
    }

    pub fn project_ray(&self, ray: &Ray) -> RayProjection {
        let max_length = self.config.max_ray_length;
        let mut best: Option<SurfaceHit> = None;

        for &distance in self
            .config
            .sample_distances
            .iter()
            .take_while(|d| **d <= max_length)
        {
            let sample = ray.at(distance);
            if let Some(hit) = self.closest_surface_point(sample, self.config.snap_radius) {
                if best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }

        match best {
            Some(hit) => RayProjection::OnSurface(hit.point),
            None => RayProjection::Synthetic(ray.at(self.config.synthetic_distance.min(max_length))),
        }
    }

    /// Re-anchor a stored point onto the nearest surface, or return it
    /// unchanged when nothing is within snap radius
    pub fn project_point_to_surface(&self, point: Vec3) -> Vec3 {
        self.closest_surface_point(point, self.config.snap_radius)
            .map_or(point, |hit| hit.point)
    }
}
