//! Siteview Annotation - Comments pinned to model geometry
//!
//! - `Comment` - the persisted entity, optionally anchored to a world point
//! - `AnnotationStore` - optimistic local state plus derived markers
//! - `CommentBackend` - remote persistence seam (`MemoryBackend`, `JsonFileBackend`)

mod backend;
mod comment;
mod store;

pub use backend::{CommentBackend, JsonFileBackend, MemoryBackend};
pub use comment::{Anchor, Comment, SyncState};
pub use store::{AnnotationStore, Marker};
