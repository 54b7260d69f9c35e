//! Screen/world projection math shared by the gizmo and the viewer

use siteview_anchor::Ray;
use siteview_core::Vec3;
use siteview_scene::{mat4_transform_point, Camera};

/// Size of the render surface in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn center(&self) -> [f32; 2] {
        [self.width * 0.5, self.height * 0.5]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Project a world-space point to screen coordinates.
/// Returns None if the point is behind the camera.
pub fn world_to_screen(camera: &Camera, viewport: Viewport, pos: Vec3) -> Option<[f32; 2]> {
    let vp = camera.view_projection_matrix();
    let clip_x = vp[0][0] * pos.x + vp[1][0] * pos.y + vp[2][0] * pos.z + vp[3][0];
    let clip_y = vp[0][1] * pos.x + vp[1][1] * pos.y + vp[2][1] * pos.z + vp[3][1];
    let clip_w = vp[0][3] * pos.x + vp[1][3] * pos.y + vp[2][3] * pos.z + vp[3][3];

    if clip_w <= 0.001 {
        return None;
    }

    let ndc_x = clip_x / clip_w;
    let ndc_y = clip_y / clip_w;

    Some([
        (ndc_x + 1.0) * 0.5 * viewport.width,
        (1.0 - ndc_y) * 0.5 * viewport.height,
    ])
}

/// World-space ray through a screen pixel
pub fn screen_to_world_ray(camera: &Camera, viewport: Viewport, screen: [f32; 2]) -> Ray {
    let inv_vp = camera.inverse_view_projection_matrix();

    let ndc_x = (screen[0] / viewport.width) * 2.0 - 1.0;
    let ndc_y = 1.0 - (screen[1] / viewport.height) * 2.0;

    let near = mat4_transform_point(&inv_vp, Vec3::new(ndc_x, ndc_y, -1.0));
    let far = mat4_transform_point(&inv_vp, Vec3::new(ndc_x, ndc_y, 1.0));

    Ray::new(near, far - near).unwrap_or(Ray {
        origin: near,
        direction: Vec3::new(0.0, 0.0, -1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        camera.aspect = Viewport::default().aspect();
        camera
    }

    #[test]
    fn test_center_pixel_looks_forward() {
        let cam = camera();
        let viewport = Viewport::default();
        let ray = screen_to_world_ray(&cam, viewport, viewport.center());
        assert!(ray.direction.distance(&cam.forward_vector()) < 1e-3);
        assert!(ray.distance_to_point(Vec3::ZERO) < 1e-3);
    }

    #[test]
    fn test_world_to_screen_round_trip() {
        let cam = camera();
        let viewport = Viewport::default();
        let target = Vec3::new(1.5, -0.75, 2.0);
        let screen = world_to_screen(&cam, viewport, target).unwrap();
        let ray = screen_to_world_ray(&cam, viewport, screen);
        assert!(ray.distance_to_point(target) < 1e-2);
    }

    #[test]
    fn test_behind_camera() {
        let cam = camera();
        assert!(world_to_screen(&cam, Viewport::default(), Vec3::new(0.0, 0.0, 20.0)).is_none());
    }
}
