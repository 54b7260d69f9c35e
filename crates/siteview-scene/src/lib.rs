//! Siteview Scene - The scene-engine boundary
//!
//! The rendering engine and the model import pipeline live outside this
//! workspace. This crate pins down the interface Siteview consumes from them:
//! - `SceneEngine` - element visibility, structure/property queries, objects, camera
//! - `RawNode` / `PropertySet` - the loosely-typed imported structure
//! - `Camera` / `CameraControls` - the navigation state annotation mode suspends
//! - `MemoryEngine` - a complete in-memory engine loaded from a JSON scene document

mod camera;
mod engine;
mod memory;
mod mesh;
mod raw;

pub use camera::{mat4_transform_point, Camera, CameraControls};
pub use engine::{EngineCall, ObjectHandle, ObjectKind, SceneEngine, SceneObject};
pub use memory::{MemoryEngine, SceneDocument};
pub use mesh::{MeshBounds, SceneMaterial, SceneMesh};
pub use raw::{Property, PropertySet, RawNode};
