//! Siteview Viewer - Interaction and model lifecycle
//!
//! - `AnnotationGizmo` - draggable axis handle with enlarged pick proxies
//! - `GizmoInteractionController` - annotation mode driven by pointer input
//! - `ModelViewer` - owns one model's engine and everything derived from it
//! - screen/world projection helpers

mod gizmo;
mod projection;
mod session;
mod viewer;

pub use gizmo::{AnnotationGizmo, Axis, SignedAxis};
pub use projection::{screen_to_world_ray, world_to_screen, Viewport};
pub use session::{drag_displacement, AnnotationSession, GizmoInteractionController, GizmoState, PointerOutcome};
pub use viewer::{spawn_import, ImportEvent, ImportHandle, ModelViewer};
