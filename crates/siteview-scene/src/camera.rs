//! Perspective camera with orbit navigation and switchable controls

use serde::{Deserialize, Serialize};
use siteview_core::Vec3;

/// Which navigation inputs the camera controller currently honors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraControls {
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_damping: bool,
}

impl CameraControls {
    pub const ALL: Self = Self {
        enable_rotate: true,
        enable_pan: true,
        enable_zoom: true,
        enable_damping: true,
    };

    pub const NONE: Self = Self {
        enable_rotate: false,
        enable_pan: false,
        enable_zoom: false,
        enable_damping: false,
    };
}

impl Default for CameraControls {
    fn default() -> Self {
        Self::ALL
    }
}

/// A perspective camera looking from `position` at `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    #[serde(default = "default_up")]
    pub up: Vec3,
    /// Field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Aspect ratio (width / height)
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default)]
    pub controls: CameraControls,
}

fn default_up() -> Vec3 {
    Vec3::UP
}
fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    1000.0
}
fn default_aspect() -> f32 {
    16.0 / 9.0
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(10.0, 10.0, 10.0),
            target: Vec3::ZERO,
            up: default_up(),
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
            aspect: default_aspect(),
            controls: CameraControls::default(),
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(&self.target)
    }

    /// Orbit around the target. Ignored while rotation is disabled.
    pub fn orbit(&mut self, dyaw: f32, dpitch: f32) -> bool {
        if !self.controls.enable_rotate {
            return false;
        }
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }
        let yaw = offset.x.atan2(offset.z) + dyaw;
        // Clamp pitch short of the poles to keep the up vector meaningful
        let pitch = ((offset.y / radius).asin() + dpitch).clamp(-1.56, 1.56);
        self.position = Vec3::new(
            self.target.x + radius * pitch.cos() * yaw.sin(),
            self.target.y + radius * pitch.sin(),
            self.target.z + radius * pitch.cos() * yaw.cos(),
        );
        true
    }

    /// Move camera and target together. Ignored while panning is disabled.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if !self.controls.enable_pan {
            return false;
        }
        let right = self.right_vector();
        let up = self.up_vector();
        let delta = right * dx + up * dy;
        self.position = self.position + delta;
        self.target = self.target + delta;
        true
    }

    /// Dolly toward the target. Ignored while zooming is disabled.
    pub fn zoom(&mut self, delta: f32) -> bool {
        if !self.controls.enable_zoom {
            return false;
        }
        let distance = (self.distance() - delta).max(0.5);
        self.position = self.target - self.forward_vector() * distance;
        true
    }

    pub fn forward_vector(&self) -> Vec3 {
        (self.target - self.position).normalized()
    }

    pub fn right_vector(&self) -> Vec3 {
        self.forward_vector().cross(&self.up).normalized()
    }

    pub fn up_vector(&self) -> Vec3 {
        let f = self.forward_vector();
        f.cross(&self.up).normalized().cross(&f)
    }

    /// Get the view matrix (4x4, column-major)
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        let f = self.forward_vector();
        let s = f.cross(&self.up).normalized();
        let u = s.cross(&f);

        [
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [
                -s.dot(&self.position),
                -u.dot(&self.position),
                f.dot(&self.position),
                1.0,
            ],
        ]
    }

    /// Get the projection matrix (4x4, column-major)
    pub fn projection_matrix(&self) -> [[f32; 4]; 4] {
        let f = 1.0 / (self.fov.to_radians() / 2.0).tan();
        let depth = self.far - self.near;

        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, -(self.far + self.near) / depth, -1.0],
            [0.0, 0.0, -(2.0 * self.far * self.near) / depth, 0.0],
        ]
    }

    pub fn view_projection_matrix(&self) -> [[f32; 4]; 4] {
        mat4_mul(&self.projection_matrix(), &self.view_matrix())
    }

    /// Inverse of the view-projection matrix (for unprojecting)
    pub fn inverse_view_projection_matrix(&self) -> [[f32; 4]; 4] {
        mat4_inverse(&self.view_projection_matrix())
    }
}

/// Transform a 3D point by a 4x4 column-major matrix (with perspective divide)
pub fn mat4_transform_point(m: &[[f32; 4]; 4], p: Vec3) -> Vec3 {
    let x = m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0];
    let y = m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1];
    let z = m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2];
    let w = m[0][3] * p.x + m[1][3] * p.y + m[2][3] * p.z + m[3][3];

    if w.abs() < 1e-10 {
        Vec3::new(x, y, z)
    } else {
        Vec3::new(x / w, y / w, z / w)
    }
}

fn mat4_mul(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }
    result
}

/// Inverse of a 4x4 column-major matrix by cofactor expansion.
/// Singular input yields the identity.
fn mat4_inverse(m: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let s = |col: usize, row: usize| -> f32 { m[col][row] };

    let c00 = s(2, 2) * s(3, 3) - s(3, 2) * s(2, 3);
    let c02 = s(1, 2) * s(3, 3) - s(3, 2) * s(1, 3);
    let c03 = s(1, 2) * s(2, 3) - s(2, 2) * s(1, 3);
    let c04 = s(2, 1) * s(3, 3) - s(3, 1) * s(2, 3);
    let c06 = s(1, 1) * s(3, 3) - s(3, 1) * s(1, 3);
    let c07 = s(1, 1) * s(2, 3) - s(2, 1) * s(1, 3);
    let c08 = s(2, 1) * s(3, 2) - s(3, 1) * s(2, 2);
    let c10 = s(1, 1) * s(3, 2) - s(3, 1) * s(1, 2);
    let c11 = s(1, 1) * s(2, 2) - s(2, 1) * s(1, 2);
    let c12 = s(2, 0) * s(3, 3) - s(3, 0) * s(2, 3);
    let c14 = s(1, 0) * s(3, 3) - s(3, 0) * s(1, 3);
    let c15 = s(1, 0) * s(2, 3) - s(2, 0) * s(1, 3);
    let c16 = s(2, 0) * s(3, 2) - s(3, 0) * s(2, 2);
    let c18 = s(1, 0) * s(3, 2) - s(3, 0) * s(1, 2);
    let c19 = s(1, 0) * s(2, 2) - s(2, 0) * s(1, 2);
    let c20 = s(2, 0) * s(3, 1) - s(3, 0) * s(2, 1);
    let c22 = s(1, 0) * s(3, 1) - s(3, 0) * s(1, 1);
    let c23 = s(1, 0) * s(2, 1) - s(2, 0) * s(1, 1);

    let f0 = [c00, c00, c02, c03];
    let f1 = [c04, c04, c06, c07];
    let f2 = [c08, c08, c10, c11];
    let f3 = [c12, c12, c14, c15];
    let f4 = [c16, c16, c18, c19];
    let f5 = [c20, c20, c22, c23];

    let v0 = [s(1, 0), s(0, 0), s(0, 0), s(0, 0)];
    let v1 = [s(1, 1), s(0, 1), s(0, 1), s(0, 1)];
    let v2 = [s(1, 2), s(0, 2), s(0, 2), s(0, 2)];
    let v3 = [s(1, 3), s(0, 3), s(0, 3), s(0, 3)];

    let mut inv = [[0.0f32; 4]; 4];
    let sign_a = [1.0, -1.0, 1.0, -1.0];
    let sign_b = [-1.0, 1.0, -1.0, 1.0];

    for i in 0..4 {
        inv[0][i] = sign_a[i] * (v1[i] * f0[i] - v2[i] * f1[i] + v3[i] * f2[i]);
        inv[1][i] = sign_b[i] * (v0[i] * f0[i] - v2[i] * f3[i] + v3[i] * f4[i]);
        inv[2][i] = sign_a[i] * (v0[i] * f1[i] - v1[i] * f3[i] + v3[i] * f5[i]);
        inv[3][i] = sign_b[i] * (v0[i] * f2[i] - v1[i] * f4[i] + v2[i] * f5[i]);
    }

    let det = s(0, 0) * inv[0][0] + s(1, 0) * inv[0][1] + s(2, 0) * inv[0][2] + s(3, 0) * inv[0][3];

    if det.abs() < 1e-10 {
        return [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
    }

    let inv_det = 1.0 / det;
    for col in &mut inv {
        for val in col.iter_mut() {
            *val *= inv_det;
        }
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(&b) < 1e-3
    }

    #[test]
    fn test_forward_vector() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert!(approx(cam.forward_vector(), Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx(cam.right_vector(), Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(cam.up_vector(), Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_inverse_round_trip() {
        let cam = Camera::new(Vec3::new(4.0, 3.0, 9.0), Vec3::new(1.0, 0.0, 0.0));
        let vp = cam.view_projection_matrix();
        let inv = cam.inverse_view_projection_matrix();
        let p = Vec3::new(0.5, 1.0, -0.25);
        let back = mat4_transform_point(&inv, mat4_transform_point(&vp, p));
        assert!(approx(back, p));
    }

    #[test]
    fn test_disabled_controls_block_navigation() {
        let mut cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        cam.controls = CameraControls::NONE;
        let before = cam.clone();

        assert!(!cam.orbit(0.5, 0.2));
        assert!(!cam.pan(1.0, 1.0));
        assert!(!cam.zoom(2.0));
        assert_eq!(cam, before);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert!(cam.orbit(0.7, 0.3));
        assert!((cam.distance() - 10.0).abs() < 1e-3);
    }
}
