//! Surface projection queries

use anyhow::{Context, Result};
use siteview_anchor::{RayProjection, SurfaceAnchorResolver};
use siteview_core::{SiteviewConfig, Vec3};
use siteview_scene::{MemoryEngine, SceneEngine};

fn resolver_for(scene: &str) -> Result<SurfaceAnchorResolver> {
    let config = SiteviewConfig::load().context("Failed to load configuration")?;
    let bytes = std::fs::read(scene).with_context(|| format!("Failed to read scene: {}", scene))?;
    let engine = MemoryEngine::from_json(&bytes).with_context(|| format!("Failed to parse scene: {}", scene))?;
    let resolver = SurfaceAnchorResolver::from_meshes(config.anchor, engine.meshes());
    log::info!(
        "Indexed {} of {} meshes",
        resolver.indexed_mesh_count(),
        resolver.mesh_count()
    );
    Ok(resolver)
}

fn fmt_point(p: Vec3) -> String {
    format!("{:.4}, {:.4}, {:.4}", p.x, p.y, p.z)
}

pub fn ray(scene: &str, origin: [f32; 3], direction: [f32; 3]) -> Result<()> {
    let resolver = resolver_for(scene)?;
    let projection = resolver
        .project_ray_to_surface(Vec3::from_array(origin), Vec3::from_array(direction))
        .context("Ray direction must be non-zero and finite")?;

    match projection {
        RayProjection::OnSurface(p) => println!("on surface: {}", fmt_point(p)),
        RayProjection::Synthetic(p) => println!("no surface in range, synthetic point: {}", fmt_point(p)),
    }
    Ok(())
}

pub fn point(scene: &str, point: [f32; 3]) -> Result<()> {
    let resolver = resolver_for(scene)?;
    let input = Vec3::from_array(point);
    let radius = resolver.config().snap_radius;

    match resolver.closest_surface_point(input, radius) {
        Some(hit) => {
            let element = hit.element.map_or("-".to_string(), |e| e.to_string());
            println!(
                "snapped: {}  (distance {:.4}, element {})",
                fmt_point(hit.point),
                hit.distance,
                element
            );
        }
        None => println!("no surface within {}: {}", radius, fmt_point(input)),
    }
    Ok(())
}
