//! Median-split BVH over one mesh's triangles

use crate::geometry::{closest_point_on_triangle, Aabb};
use siteview_core::Vec3;
use siteview_scene::SceneMesh;

/// Leaves never split past this depth
const MAX_DEPTH: u32 = 64;

#[derive(Debug, Clone, Copy)]
enum BvhNodeKind {
    /// Range into `tri_order`
    Leaf { first: u32, count: u32 },
    Internal { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    kind: BvhNodeKind,
}

/// Recursive build information
struct BuildInfo {
    bounds: Aabb,
    first: usize,
    count: usize,
    depth: u32,
}

/// Bounding-volume hierarchy for closest-point queries on a single mesh.
///
/// Keeps its own copy of the triangle corners, so queries don't need the
/// source mesh.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    tri_order: Vec<u32>,
    triangles: Vec<[Vec3; 3]>,
}

impl Bvh {
    /// Build over the mesh's triangles.
    ///
    /// `None` when the mesh has no triangles or an index points past its
    /// vertex buffer.
    pub fn build(mesh: &SceneMesh, max_leaf_size: usize) -> Option<Self> {
        if mesh.indices.is_empty() {
            return None;
        }

        let mut triangles = Vec::with_capacity(mesh.indices.len());
        for tri in &mesh.indices {
            triangles.push([mesh.vertex(tri[0])?, mesh.vertex(tri[1])?, mesh.vertex(tri[2])?]);
        }

        let tri_bounds: Vec<Aabb> = triangles
            .iter()
            .map(|[a, b, c]| {
                let mut aabb = Aabb::empty();
                aabb.expand_point(*a);
                aabb.expand_point(*b);
                aabb.expand_point(*c);
                aabb
            })
            .collect();
        let centroids: Vec<Vec3> = triangles
            .iter()
            .map(|[a, b, c]| (*a + *b + *c) * (1.0 / 3.0))
            .collect();

        let mut world = Aabb::empty();
        for aabb in &tri_bounds {
            world.expand_aabb(aabb);
        }

        let mut bvh = Self {
            nodes: Vec::new(),
            tri_order: (0..triangles.len() as u32).collect(),
            triangles,
        };
        let info = BuildInfo {
            bounds: world,
            first: 0,
            count: bvh.triangles.len(),
            depth: 0,
        };
        bvh.build_recursive(&tri_bounds, &centroids, info, max_leaf_size.max(1));
        Some(bvh)
    }

    fn build_recursive(
        &mut self,
        tri_bounds: &[Aabb],
        centroids: &[Vec3],
        info: BuildInfo,
        max_leaf_size: usize,
    ) -> u32 {
        let node_index = self.nodes.len() as u32;
        let leaf = BvhNode {
            bounds: info.bounds,
            kind: BvhNodeKind::Leaf {
                first: info.first as u32,
                count: info.count as u32,
            },
        };

        if info.count <= max_leaf_size || info.depth >= MAX_DEPTH {
            self.nodes.push(leaf);
            return node_index;
        }

        // Split on the longest axis of the centroid bounds, at the median
        let range = info.first..info.first + info.count;
        let mut centroid_bounds = Aabb::empty();
        for &tri in &self.tri_order[range.clone()] {
            centroid_bounds.expand_point(centroids[tri as usize]);
        }
        let axis = centroid_bounds.longest_axis();
        if centroid_bounds.extent().axis(axis) <= f32::EPSILON {
            self.nodes.push(leaf);
            return node_index;
        }

        let mid = info.count / 2;
        self.tri_order[range].select_nth_unstable_by(mid, |a, b| {
            centroids[*a as usize]
                .axis(axis)
                .total_cmp(&centroids[*b as usize].axis(axis))
        });

        // Reserve this node, fill in children afterwards
        self.nodes.push(leaf);

        let left_info = BuildInfo {
            bounds: self.range_bounds(tri_bounds, info.first, mid),
            first: info.first,
            count: mid,
            depth: info.depth + 1,
        };
        let right_info = BuildInfo {
            bounds: self.range_bounds(tri_bounds, info.first + mid, info.count - mid),
            first: info.first + mid,
            count: info.count - mid,
            depth: info.depth + 1,
        };

        let left = self.build_recursive(tri_bounds, centroids, left_info, max_leaf_size);
        let right = self.build_recursive(tri_bounds, centroids, right_info, max_leaf_size);
        self.nodes[node_index as usize].kind = BvhNodeKind::Internal { left, right };
        node_index
    }

    fn range_bounds(&self, tri_bounds: &[Aabb], first: usize, count: usize) -> Aabb {
        let mut aabb = Aabb::empty();
        for &tri in &self.tri_order[first..first + count] {
            aabb.expand_aabb(&tri_bounds[tri as usize]);
        }
        aabb
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or_else(Aabb::empty, |n| n.bounds)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Closest surface point to `point` no farther than `radius`
    pub fn closest_point(&self, point: Vec3, radius: f32) -> Option<(Vec3, f32)> {
        let mut best: Option<Vec3> = None;
        let mut best_d2 = radius * radius;

        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index as usize) else {
                continue;
            };
            if node.bounds.distance_squared_to(point) > best_d2 {
                continue;
            }
            match node.kind {
                BvhNodeKind::Leaf { first, count } => {
                    for &tri in &self.tri_order[first as usize..(first + count) as usize] {
                        let [a, b, c] = self.triangles[tri as usize];
                        let candidate = closest_point_on_triangle(point, a, b, c);
                        let d2 = candidate.distance_squared(&point);
                        if d2 <= best_d2 {
                            best_d2 = d2;
                            best = Some(candidate);
                        }
                    }
                }
                BvhNodeKind::Internal { left, right } => {
                    // Visit the nearer child first
                    let dl = self.nodes[left as usize].bounds.distance_squared_to(point);
                    let dr = self.nodes[right as usize].bounds.distance_squared_to(point);
                    if dl < dr {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best.map(|p| (p, best_d2.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A flat grid of `n` x `n` quads in the XZ plane at height `y`
    fn grid(n: u32, y: f32) -> SceneMesh {
        let mut positions = Vec::new();
        for z in 0..=n {
            for x in 0..=n {
                positions.push([x as f32, y, z as f32]);
            }
        }
        let mut indices = Vec::new();
        let row = n + 1;
        for z in 0..n {
            for x in 0..n {
                let i = z * row + x;
                indices.push([i, i + 1, i + row]);
                indices.push([i + 1, i + row + 1, i + row]);
            }
        }
        SceneMesh::new(positions, indices)
    }

    #[test]
    fn test_build_splits() {
        let bvh = Bvh::build(&grid(8, 0.0), 4).unwrap();
        assert_eq!(bvh.triangle_count(), 128);
        assert!(bvh.node_count() > 1);
        assert_eq!(bvh.bounds().max, Vec3::new(8.0, 0.0, 8.0));
    }

    #[test]
    fn test_closest_point_above_grid() {
        let mesh = grid(8, 0.0);
        let bvh = Bvh::build(&mesh, 4).unwrap();
        let (p, d) = bvh.closest_point(Vec3::new(3.3, 2.0, 5.7), 12.0).unwrap();
        assert!(p.distance(&Vec3::new(3.3, 0.0, 5.7)) < 1e-4);
        assert!((d - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_matches_brute_force() {
        let mesh = grid(6, 1.0);
        let bvh = Bvh::build(&mesh, 2).unwrap();
        let query = Vec3::new(-2.0, 4.0, 9.0);

        let brute = mesh
            .indices
            .iter()
            .map(|t| {
                let [a, b, c] = [mesh.vertex(t[0]).unwrap(), mesh.vertex(t[1]).unwrap(), mesh.vertex(t[2]).unwrap()];
                closest_point_on_triangle(query, a, b, c).distance(&query)
            })
            .fold(f32::INFINITY, f32::min);

        let (_, d) = bvh.closest_point(query, 100.0).unwrap();
        assert!((d - brute).abs() < 1e-4);
    }

    #[test]
    fn test_radius_limits_result() {
        let bvh = Bvh::build(&grid(2, 0.0), 4).unwrap();
        assert!(bvh.closest_point(Vec3::new(1.0, 20.0, 1.0), 12.0).is_none());
    }

    #[test]
    fn test_unbuildable_meshes() {
        assert!(Bvh::build(&SceneMesh::new(vec![[0.0; 3]], vec![]), 4).is_none());
        assert!(Bvh::build(&SceneMesh::new(vec![[0.0; 3]], vec![[0, 1, 2]]), 4).is_none());
    }
}
