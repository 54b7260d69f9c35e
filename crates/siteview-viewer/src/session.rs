//! Annotation mode: the session object and the pointer-driven controller

use crate::gizmo::{AnnotationGizmo, Axis, SignedAxis};
use crate::projection::{screen_to_world_ray, Viewport};
use siteview_anchor::SurfaceAnchorResolver;
use siteview_core::{Color, GizmoConfig, PointerButton, Vec3};
use siteview_scene::{CameraControls, ObjectHandle, ObjectKind, SceneEngine, SceneObject};

const PREVIEW_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.6);

/// Where the controller is in its interaction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoState {
    /// Annotation mode is off
    Hidden,
    Placed,
    AxisHover(SignedAxis),
    Dragging(Axis),
}

/// What a pointer press did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// An axis was grabbed
    BeganDrag(Axis),
    /// The gizmo position was captured as the pending anchor
    Placed(Vec3),
    Ignored,
}

/// Scale screen movement into a displacement along `axis`.
///
/// The mapping ignores camera orientation: x follows horizontal movement,
/// y follows inverted vertical movement, z follows the diagonal.
pub fn drag_displacement(axis: Axis, delta: [f32; 2], scale: [f32; 3]) -> f32 {
    let [dx, dy] = delta;
    match axis {
        Axis::X => dx * scale[0],
        Axis::Y => -dy * scale[1],
        Axis::Z => (dx + dy) * 0.5 * scale[2],
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    axis: Axis,
    start_pointer: [f32; 2],
    start_position: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct MaterialBackup {
    index: usize,
    opacity: f32,
    transparent: bool,
}

/// Everything annotation mode owns while it is active.
///
/// Created on enter and consumed on exit; nothing outlives it.
#[derive(Debug)]
pub struct AnnotationSession {
    gizmo: AnnotationGizmo,
    controls_snapshot: CameraControls,
    materials: Vec<MaterialBackup>,
    hovered: Option<SignedAxis>,
    drag: Option<DragState>,
    preview: Option<ObjectHandle>,
}

impl AnnotationSession {
    pub fn gizmo(&self) -> &AnnotationGizmo {
        &self.gizmo
    }

    pub fn controls_snapshot(&self) -> CameraControls {
        self.controls_snapshot
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn preview_marker(&self) -> Option<ObjectHandle> {
        self.preview
    }

    fn state(&self) -> GizmoState {
        match (self.drag, self.hovered) {
            (Some(drag), _) => GizmoState::Dragging(drag.axis),
            (None, Some(axis)) => GizmoState::AxisHover(axis),
            (None, None) => GizmoState::Placed,
        }
    }

    fn remove_preview(&mut self, engine: &mut dyn SceneEngine) {
        if let Some(handle) = self.preview.take() {
            engine.remove_object(handle);
        }
    }

    fn show_preview(&mut self, engine: &mut dyn SceneEngine, position: Vec3) {
        let object = SceneObject::new(ObjectKind::PreviewMarker, position).with_color(PREVIEW_COLOR);
        match self.preview {
            Some(handle) if engine.update_object(handle, object.clone()) => {}
            _ => self.preview = Some(engine.add_object(object)),
        }
    }

    /// Remove scene objects and hand back what must be restored
    fn close(mut self, engine: &mut dyn SceneEngine) -> (CameraControls, Vec<MaterialBackup>) {
        self.remove_preview(engine);
        self.gizmo.dispose(engine);
        (self.controls_snapshot, self.materials)
    }
}

/// Drives annotation mode from pointer input.
///
/// Every operation is a no-op without a loaded model and an active camera.
#[derive(Debug)]
pub struct GizmoInteractionController {
    config: GizmoConfig,
    session: Option<AnnotationSession>,
    pending_anchor: Option<Vec3>,
}

impl GizmoInteractionController {
    pub fn new(config: GizmoConfig) -> Self {
        Self {
            config,
            session: None,
            pending_anchor: None,
        }
    }

    pub fn config(&self) -> &GizmoConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&AnnotationSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> GizmoState {
        self.session
            .as_ref()
            .map_or(GizmoState::Hidden, AnnotationSession::state)
    }

    pub fn gizmo_position(&self) -> Option<Vec3> {
        self.session.as_ref().map(|s| s.gizmo.position())
    }

    /// The most recently confirmed anchor, if not yet taken
    pub fn pending_anchor(&self) -> Option<Vec3> {
        self.pending_anchor
    }

    pub fn take_pending_anchor(&mut self) -> Option<Vec3> {
        self.pending_anchor.take()
    }

    /// Enter annotation mode.
    ///
    /// Suspends camera navigation, makes the model translucent, and spawns
    /// the gizmo in front of the camera. Returns false if the mode was
    /// already active or a dependency is missing.
    pub fn enter(&mut self, engine: &mut dyn SceneEngine) -> bool {
        if self.session.is_some() || !engine.is_model_loaded() {
            return false;
        }
        let Some(camera) = engine.camera_mut() else {
            return false;
        };

        let controls_snapshot = camera.controls;
        camera.controls = CameraControls::NONE;
        let spawn = camera.position + camera.forward_vector() * self.config.spawn_distance;

        let target = self.config.model_opacity;
        let mut materials = Vec::new();
        for (index, material) in engine.materials_mut().iter_mut().enumerate() {
            if material.opacity <= target {
                continue;
            }
            materials.push(MaterialBackup {
                index,
                opacity: material.opacity,
                transparent: material.transparent,
            });
            material.opacity = target;
            material.transparent = true;
        }

        let gizmo = AnnotationGizmo::spawn(engine, spawn, &self.config);
        engine.request_render();

        log::info!(
            "Annotation mode on: gizmo at ({:.2}, {:.2}, {:.2}), {} materials dimmed",
            spawn.x,
            spawn.y,
            spawn.z,
            materials.len()
        );

        self.session = Some(AnnotationSession {
            gizmo,
            controls_snapshot,
            materials,
            hovered: None,
            drag: None,
            preview: None,
        });
        true
    }

    /// Leave annotation mode, restoring opacity and camera controls exactly
    /// as they were on entry. Safe to call repeatedly.
    pub fn exit(&mut self, engine: &mut dyn SceneEngine) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let (controls, materials) = session.close(engine);

        let current = engine.materials_mut();
        for backup in materials {
            if let Some(material) = current.get_mut(backup.index) {
                material.opacity = backup.opacity;
                material.transparent = backup.transparent;
            }
        }
        if let Some(camera) = engine.camera_mut() {
            camera.controls = controls;
        }
        engine.request_render();

        log::info!("Annotation mode off");
        true
    }

    /// Hover or drag, depending on state. Returns true if anything changed.
    pub fn on_pointer_move(
        &mut self,
        engine: &mut dyn SceneEngine,
        resolver: &SurfaceAnchorResolver,
        viewport: Viewport,
        pointer: [f32; 2],
    ) -> bool {
        if !engine.is_model_loaded() {
            return false;
        }
        let Some(ray) = engine.camera().map(|c| screen_to_world_ray(c, viewport, pointer)) else {
            return false;
        };
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if let Some(drag) = session.drag {
            let delta = [
                pointer[0] - drag.start_pointer[0],
                pointer[1] - drag.start_pointer[1],
            ];
            let displacement = drag_displacement(drag.axis, delta, self.config.drag_scale);
            let mut position = drag.start_position + drag.axis.unit() * displacement;
            if self.config.snap_to_surface {
                position = resolver.project_point_to_surface(position);
            }
            session.gizmo.move_to(engine, position);
            engine.request_render();
            return true;
        }

        let hovered = session.gizmo.pick(&ray);
        let changed = hovered != session.hovered;
        session.hovered = hovered;
        session.gizmo.set_highlight(engine, hovered);

        if hovered.is_none() && self.config.surface_preview {
            session.show_preview(engine, resolver.project_ray(&ray).point());
        } else {
            session.remove_preview(engine);
        }

        engine.request_render();
        changed || self.config.surface_preview
    }

    /// Grab an axis with the manipulation button, or confirm the current
    /// gizmo position with a primary click off the axes
    pub fn on_pointer_down(
        &mut self,
        engine: &mut dyn SceneEngine,
        viewport: Viewport,
        pointer: [f32; 2],
        button: PointerButton,
    ) -> PointerOutcome {
        if !engine.is_model_loaded() {
            return PointerOutcome::Ignored;
        }
        let Some(ray) = engine.camera().map(|c| screen_to_world_ray(c, viewport, pointer)) else {
            return PointerOutcome::Ignored;
        };
        let Some(session) = self.session.as_mut() else {
            return PointerOutcome::Ignored;
        };
        if session.drag.is_some() {
            return PointerOutcome::Ignored;
        }

        let hit = session.gizmo.pick(&ray);
        session.hovered = hit;
        session.gizmo.set_highlight(engine, hit);

        match hit {
            Some(axis) if button == self.config.manipulation_button => {
                session.drag = Some(DragState {
                    axis: axis.axis,
                    start_pointer: pointer,
                    start_position: session.gizmo.position(),
                });
                session.remove_preview(engine);
                log::debug!("Drag started on {:?}", axis.axis);
                PointerOutcome::BeganDrag(axis.axis)
            }
            None if button == PointerButton::Primary => {
                let anchor = session.gizmo.position();
                self.pending_anchor = Some(anchor);
                log::debug!("Anchor placed at ({:.2}, {:.2}, {:.2})", anchor.x, anchor.y, anchor.z);
                PointerOutcome::Placed(anchor)
            }
            _ => PointerOutcome::Ignored,
        }
    }

    /// End a drag. The gizmo stays where it is and the camera stays locked.
    pub fn on_pointer_up(&mut self, button: PointerButton) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if button != self.config.manipulation_button || session.drag.is_none() {
            return false;
        }
        session.drag = None;
        true
    }

    /// Whether the host's context menu should be suppressed
    pub fn on_context_menu(&self) -> bool {
        self.session.is_some() && self.config.manipulation_button == PointerButton::Secondary
    }

    /// Abort a drag and put the gizmo back where the drag began
    pub fn cancel_drag(&mut self, engine: &mut dyn SceneEngine) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(drag) = session.drag.take() else {
            return false;
        };
        session.gizmo.move_to(engine, drag.start_position);
        engine.request_render();
        true
    }
}
