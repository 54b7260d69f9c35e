//! Siteview Anchor - Snapping points and rays to model surfaces
//!
//! - `Bvh` - median-split bounding-volume hierarchy over one mesh's triangles
//! - `SurfaceAnchorResolver` - ray and point projection across all loaded meshes
//! - `Ray` / `Aabb` - the shared geometry primitives

mod bvh;
mod geometry;
mod resolver;

pub use bvh::Bvh;
pub use geometry::{closest_point_on_triangle, ray_intersect, Aabb, Ray};
pub use resolver::{RayProjection, SurfaceAnchorResolver, SurfaceHit};
