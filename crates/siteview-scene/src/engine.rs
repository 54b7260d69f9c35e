//! The scene-engine trait and the objects Siteview adds to a scene

use crate::camera::Camera;
use crate::mesh::{SceneMaterial, SceneMesh};
use crate::raw::PropertySet;
use siteview_core::{Color, ElementId, Result, Vec3};

/// Handle to an object added with [`SceneEngine::add_object`]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// What an added object represents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Center handle of the annotation gizmo
    GizmoCenter,
    /// Visual arrow along a signed unit axis
    GizmoArrow { direction: Vec3 },
    /// Invisible pick volume for one signed axis (axis-aligned box)
    HitProxy { min: Vec3, max: Vec3 },
    /// Marker pinned to a comment's anchor
    CommentMarker,
    /// Marker showing where the pointer ray meets the model
    PreviewMarker,
}

/// A render object owned by Siteview but living in the engine's scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub position: Vec3,
    pub scale: f32,
    pub color: Color,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(kind: ObjectKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            scale: 1.0,
            color: Color::WHITE,
            visible: true,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A call recorded by engines that keep a journal (used to check ordering)
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetVisible { count: usize, visible: bool },
    Render,
    AddObject(ObjectHandle),
    RemoveObject(ObjectHandle),
    Dispose,
}

/// The scene engine as seen from Siteview.
///
/// All calls happen on the UI thread. Implementations are expected to be
/// cheap to query; Siteview caches anything it needs repeatedly.
pub trait SceneEngine {
    /// True once a model has been loaded and until [`dispose`](Self::dispose)
    fn is_model_loaded(&self) -> bool;

    /// Raw spatial structure of the loaded model, if the import produced one
    fn spatial_structure(&self) -> Option<serde_json::Value>;

    /// Direct structural children of the given elements
    fn items_children(&self, ids: &[ElementId]) -> Result<Vec<ElementId>>;

    /// Property sets attached to the given elements
    fn properties(&self, ids: &[ElementId]) -> Result<Vec<PropertySet>>;

    /// Bulk visibility primitive. Does not trigger a render on its own.
    fn set_elements_visible(&mut self, ids: &[ElementId], visible: bool);

    /// Visibility of a single element, `None` if the engine doesn't know it
    fn is_element_visible(&self, id: ElementId) -> Option<bool>;

    /// Ask for one frame to be submitted
    fn request_render(&mut self);

    /// Currently loaded meshes, in world space
    fn meshes(&self) -> &[SceneMesh];

    fn materials(&self) -> &[SceneMaterial];

    fn materials_mut(&mut self) -> &mut [SceneMaterial];

    /// The active camera, if any
    fn camera(&self) -> Option<&Camera>;

    fn camera_mut(&mut self) -> Option<&mut Camera>;

    fn add_object(&mut self, object: SceneObject) -> ObjectHandle;

    /// Replace an existing object. Returns false if the handle is unknown.
    fn update_object(&mut self, handle: ObjectHandle, object: SceneObject) -> bool;

    /// Remove and free an object. Returns false if the handle is unknown.
    fn remove_object(&mut self, handle: ObjectHandle) -> bool;

    /// Release every engine resource. The engine is unusable afterwards.
    fn dispose(&mut self);
}
