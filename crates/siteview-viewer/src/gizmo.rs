//! The annotation gizmo: a center handle, six axis arrows, and six larger
//! invisible pick proxies, all living in the engine's scene

use siteview_anchor::{ray_intersect, Aabb, Ray};
use siteview_core::{Color, GizmoConfig, Vec3};
use siteview_scene::{ObjectHandle, ObjectKind, SceneEngine, SceneObject};

const X_COLOR: Color = Color::new(0.84, 0.26, 0.26, 1.0);
const Y_COLOR: Color = Color::new(0.26, 0.67, 0.26, 1.0);
const Z_COLOR: Color = Color::new(0.26, 0.46, 0.84, 1.0);
const X_BRIGHT: Color = Color::new(1.0, 0.39, 0.39, 1.0);
const Y_BRIGHT: Color = Color::new(0.39, 0.9, 0.39, 1.0);
const Z_BRIGHT: Color = Color::new(0.39, 0.59, 1.0, 1.0);
const CENTER_COLOR: Color = Color::WHITE;

/// A world axis the gizmo can be dragged along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::new(1.0, 0.0, 0.0),
            Axis::Y => Vec3::new(0.0, 1.0, 0.0),
            Axis::Z => Vec3::new(0.0, 0.0, 1.0),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn colors(&self) -> (Color, Color) {
        match self {
            Axis::X => (X_COLOR, X_BRIGHT),
            Axis::Y => (Y_COLOR, Y_BRIGHT),
            Axis::Z => (Z_COLOR, Z_BRIGHT),
        }
    }
}

/// One of the six arrow directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedAxis {
    pub axis: Axis,
    pub positive: bool,
}

impl SignedAxis {
    pub const ALL: [SignedAxis; 6] = [
        SignedAxis::new(Axis::X, true),
        SignedAxis::new(Axis::X, false),
        SignedAxis::new(Axis::Y, true),
        SignedAxis::new(Axis::Y, false),
        SignedAxis::new(Axis::Z, true),
        SignedAxis::new(Axis::Z, false),
    ];

    pub const fn new(axis: Axis, positive: bool) -> Self {
        Self { axis, positive }
    }

    pub fn direction(&self) -> Vec3 {
        if self.positive {
            self.axis.unit()
        } else {
            -self.axis.unit()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisParts {
    axis: SignedAxis,
    arrow: ObjectHandle,
    proxy: ObjectHandle,
}

/// Scene objects of a spawned gizmo
#[derive(Debug)]
pub struct AnnotationGizmo {
    position: Vec3,
    center: ObjectHandle,
    parts: Vec<AxisParts>,
    highlighted: Option<SignedAxis>,
    proxy_length: f32,
    proxy_thickness: f32,
    hover_scale: f32,
}

impl AnnotationGizmo {
    /// Add the center, arrows, and proxies to the scene
    pub fn spawn(engine: &mut dyn SceneEngine, position: Vec3, config: &GizmoConfig) -> Self {
        let center = engine.add_object(
            SceneObject::new(ObjectKind::GizmoCenter, position).with_color(CENTER_COLOR),
        );

        let mut gizmo = Self {
            position,
            center,
            parts: Vec::with_capacity(SignedAxis::ALL.len()),
            highlighted: None,
            proxy_length: config.proxy_length,
            proxy_thickness: config.proxy_thickness,
            hover_scale: config.hover_scale,
        };

        for axis in SignedAxis::ALL {
            let arrow = engine.add_object(gizmo.arrow_object(axis));
            let proxy = engine.add_object(gizmo.proxy_object(axis));
            gizmo.parts.push(AxisParts { axis, arrow, proxy });
        }
        gizmo
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn highlighted(&self) -> Option<SignedAxis> {
        self.highlighted
    }

    /// Every object handle the gizmo owns
    pub fn handles(&self) -> Vec<ObjectHandle> {
        let mut handles = vec![self.center];
        for part in &self.parts {
            handles.push(part.arrow);
            handles.push(part.proxy);
        }
        handles
    }

    /// World-space pick volume for one arrow
    pub fn proxy_bounds(&self, axis: SignedAxis) -> Aabb {
        let t = self.proxy_thickness;
        let tip = self.position + axis.direction() * self.proxy_length;
        let mut aabb = Aabb::empty();
        aabb.expand_point(self.position);
        aabb.expand_point(tip);
        aabb.min = aabb.min - Vec3::new(t, t, t) + axis.axis.unit() * t;
        aabb.max = aabb.max + Vec3::new(t, t, t) - axis.axis.unit() * t;
        aabb
    }

    /// The arrow whose proxy the ray hits first
    pub fn pick(&self, ray: &Ray) -> Option<SignedAxis> {
        self.parts
            .iter()
            .filter_map(|part| {
                ray_intersect(ray, &self.proxy_bounds(part.axis)).map(|t| (part.axis, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(axis, _)| axis)
    }

    /// Emphasize one arrow and reset the rest
    pub fn set_highlight(&mut self, engine: &mut dyn SceneEngine, axis: Option<SignedAxis>) {
        if self.highlighted == axis {
            return;
        }
        self.highlighted = axis;
        self.refresh_arrows(engine);
    }

    pub fn move_to(&mut self, engine: &mut dyn SceneEngine, position: Vec3) {
        self.position = position;
        engine.update_object(
            self.center,
            SceneObject::new(ObjectKind::GizmoCenter, position).with_color(CENTER_COLOR),
        );
        for part in &self.parts {
            engine.update_object(part.proxy, self.proxy_object(part.axis));
        }
        self.refresh_arrows(engine);
    }

    /// Remove every gizmo object from the scene
    pub fn dispose(self, engine: &mut dyn SceneEngine) {
        for handle in self.handles() {
            engine.remove_object(handle);
        }
    }

    fn refresh_arrows(&self, engine: &mut dyn SceneEngine) {
        for part in &self.parts {
            engine.update_object(part.arrow, self.arrow_object(part.axis));
        }
    }

    fn arrow_object(&self, axis: SignedAxis) -> SceneObject {
        let (base, bright) = axis.axis.colors();
        let hovered = self.highlighted == Some(axis);
        SceneObject::new(
            ObjectKind::GizmoArrow {
                direction: axis.direction(),
            },
            self.position,
        )
        .with_color(if hovered { bright } else { base })
        .with_scale(if hovered { self.hover_scale } else { 1.0 })
    }

    fn proxy_object(&self, axis: SignedAxis) -> SceneObject {
        let bounds = self.proxy_bounds(axis);
        SceneObject::new(
            ObjectKind::HitProxy {
                min: bounds.min,
                max: bounds.max,
            },
            self.position,
        )
        .hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteview_scene::MemoryEngine;

    fn spawn_at(engine: &mut MemoryEngine, position: Vec3) -> AnnotationGizmo {
        AnnotationGizmo::spawn(engine, position, &GizmoConfig::default())
    }

    #[test]
    fn test_spawn_adds_thirteen_objects() {
        let mut engine = MemoryEngine::new();
        let gizmo = spawn_at(&mut engine, Vec3::ZERO);
        assert_eq!(engine.object_count(), 13);
        let hidden = engine.objects().filter(|(_, o)| !o.visible).count();
        assert_eq!(hidden, 6);

        gizmo.dispose(&mut engine);
        assert_eq!(engine.object_count(), 0);
    }

    #[test]
    fn test_proxy_bounds_extend_along_axis() {
        let mut engine = MemoryEngine::new();
        let gizmo = spawn_at(&mut engine, Vec3::new(1.0, 1.0, 1.0));
        let b = gizmo.proxy_bounds(SignedAxis::new(Axis::X, false));
        assert!((b.min.x - -0.5).abs() < 1e-6);
        assert!((b.max.x - 1.0).abs() < 1e-6);
        assert!((b.min.y - 0.65).abs() < 1e-6);
        assert!((b.max.z - 1.35).abs() < 1e-6);
    }

    #[test]
    fn test_pick_nearest_proxy() {
        let mut engine = MemoryEngine::new();
        let gizmo = spawn_at(&mut engine, Vec3::ZERO);

        // Looking down -Z at a point on the +X arrow
        let ray = Ray::new(Vec3::new(1.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(gizmo.pick(&ray), Some(SignedAxis::new(Axis::X, true)));

        // Straight at the center from +Z: the +Z proxy is in front
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(gizmo.pick(&ray), Some(SignedAxis::new(Axis::Z, true)));

        let miss = Ray::new(Vec3::new(5.0, 5.0, 10.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(gizmo.pick(&miss), None);
    }

    #[test]
    fn test_highlight_changes_arrow_only() {
        let mut engine = MemoryEngine::new();
        let mut gizmo = spawn_at(&mut engine, Vec3::ZERO);
        let axis = SignedAxis::new(Axis::Y, true);
        gizmo.set_highlight(&mut engine, Some(axis));

        let arrows: Vec<_> = engine
            .objects()
            .filter(|(_, o)| matches!(o.kind, ObjectKind::GizmoArrow { .. }))
            .map(|(_, o)| o.clone())
            .collect();
        let emphasized: Vec<_> = arrows.iter().filter(|o| o.scale > 1.0).collect();
        assert_eq!(emphasized.len(), 1);
        assert_eq!(emphasized[0].color, Y_BRIGHT);
        assert!(matches!(emphasized[0].kind, ObjectKind::GizmoArrow { direction } if direction == Vec3::UP));
    }

    #[test]
    fn test_move_updates_objects() {
        let mut engine = MemoryEngine::new();
        let mut gizmo = spawn_at(&mut engine, Vec3::ZERO);
        gizmo.move_to(&mut engine, Vec3::new(3.0, 0.0, 0.0));
        assert!(engine.objects().all(|(_, o)| o.position == Vec3::new(3.0, 0.0, 0.0)));
    }
}
