//! Optimistic comment store and the markers derived from it

use crate::backend::CommentBackend;
use crate::comment::{Anchor, Comment, SyncState};
use siteview_anchor::SurfaceAnchorResolver;
use siteview_core::{Color, CommentConfig, CommentId, Result, SiteviewError, Vec3};
use siteview_scene::{ObjectHandle, ObjectKind, SceneEngine, SceneObject};

/// Marker color for anchored comments
const MARKER_COLOR: Color = Color::YELLOW;

/// Render object standing in for one anchored comment
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub comment: CommentId,
    pub handle: ObjectHandle,
    /// Anchor after projection onto the current surface
    pub position: Vec3,
}

/// A locally deleted comment awaiting backend confirmation
#[derive(Debug, Clone)]
struct PendingDelete {
    rank: u64,
    comment: Comment,
}

/// Comments in creation order plus their markers.
///
/// Mutations only mark the marker set stale. Callers must follow every
/// mutation with [`refresh_markers`](Self::refresh_markers) (or
/// [`sync_markers`](Self::sync_markers)); until then the engine still shows
/// the previous markers.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    author: String,
    comments: Vec<Comment>,
    /// Insertion rank of each entry in `comments`, ascending
    ranks: Vec<u64>,
    next_rank: u64,
    pending_deletes: Vec<PendingDelete>,
    markers: Vec<Marker>,
    markers_stale: bool,
}

impl AnnotationStore {
    pub fn new(config: &CommentConfig) -> Self {
        Self {
            author: config.author.clone(),
            ..Default::default()
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Insert a new comment locally. The caller persists it and then
    /// confirms or rolls back.
    pub fn create(&mut self, content: impl Into<String>, anchor: Option<Anchor>) -> Comment {
        let comment = Comment::new(content, anchor, self.author.clone());
        self.insert(comment.clone());
        comment
    }

    /// Insert an already-built comment (keeps its sync state)
    pub fn insert(&mut self, comment: Comment) {
        log::debug!("Comment {} added (anchored: {})", comment.id, comment.is_anchored());
        self.comments.push(comment);
        self.ranks.push(self.next_rank);
        self.next_rank += 1;
        self.markers_stale = true;
    }

    /// Replace everything with the backend's view
    pub fn load(&mut self, comments: Vec<Comment>) {
        self.comments = comments
            .into_iter()
            .map(|mut c| {
                c.sync = SyncState::Synced;
                c
            })
            .collect();
        self.ranks = (0..self.comments.len() as u64).collect();
        self.next_rank = self.comments.len() as u64;
        self.pending_deletes.clear();
        self.markers_stale = true;
    }

    pub fn list(&self) -> &[Comment] {
        &self.comments
    }

    /// Comments the secondary role may see
    pub fn list_for_secondary_role(&self) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.visible_to_secondary_role)
            .collect()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Remove a comment locally, keeping it for a possible rollback.
    ///
    /// Its marker stays in the engine until the next `refresh_markers`.
    pub fn delete(&mut self, id: &CommentId) -> Result<Comment> {
        let position = self
            .comments
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| SiteviewError::CommentNotFound(id.to_string()))?;
        let comment = self.comments.remove(position);
        let rank = self.ranks.remove(position);
        self.pending_deletes.push(PendingDelete {
            rank,
            comment: comment.clone(),
        });
        self.markers_stale = true;
        Ok(comment)
    }

    pub fn confirm_create(&mut self, id: &CommentId) -> bool {
        match self.comments.iter_mut().find(|c| &c.id == id) {
            Some(comment) => {
                comment.sync = SyncState::Synced;
                true
            }
            None => false,
        }
    }

    /// Undo an optimistic create
    pub fn rollback_create(&mut self, id: &CommentId) -> Option<Comment> {
        let position = self.comments.iter().position(|c| &c.id == id)?;
        log::warn!("Rolling back comment create {}", id);
        self.markers_stale = true;
        self.ranks.remove(position);
        Some(self.comments.remove(position))
    }

    pub fn confirm_delete(&mut self, id: &CommentId) -> bool {
        let before = self.pending_deletes.len();
        self.pending_deletes.retain(|p| &p.comment.id != id);
        self.pending_deletes.len() != before
    }

    /// Undo an optimistic delete, restoring the comment at its creation-order
    /// position among the comments still present
    pub fn rollback_delete(&mut self, id: &CommentId) -> bool {
        let Some(i) = self.pending_deletes.iter().position(|p| &p.comment.id == id) else {
            return false;
        };
        let pending = self.pending_deletes.remove(i);
        log::warn!("Rolling back comment delete {}", id);
        let position = self.ranks.partition_point(|r| *r < pending.rank);
        self.ranks.insert(position, pending.rank);
        self.comments.insert(position, pending.comment);
        self.markers_stale = true;
        true
    }

    /// Create locally, persist, and reconcile.
    ///
    /// On backend failure the local insert is undone and the failure is
    /// returned as [`SiteviewError::Persistence`].
    pub fn create_persisted(
        &mut self,
        backend: &mut dyn CommentBackend,
        content: impl Into<String>,
        anchor: Option<Anchor>,
    ) -> Result<Comment> {
        let comment = self.create(content, anchor);
        match backend.create(&comment) {
            Ok(()) => {
                self.confirm_create(&comment.id);
                Ok(self.get(&comment.id).cloned().unwrap_or(comment))
            }
            Err(e) => {
                self.rollback_create(&comment.id);
                Err(persistence(e))
            }
        }
    }

    /// Delete locally, persist, and reconcile
    pub fn delete_persisted(&mut self, backend: &mut dyn CommentBackend, id: &CommentId) -> Result<()> {
        self.delete(id)?;
        match backend.delete(id) {
            Ok(()) => {
                self.confirm_delete(id);
                Ok(())
            }
            Err(e) => {
                self.rollback_delete(id);
                Err(persistence(e))
            }
        }
    }

    /// Replace local state with the backend's list
    pub fn load_from(&mut self, backend: &dyn CommentBackend) -> Result<usize> {
        let comments = backend.list().map_err(persistence)?;
        let count = comments.len();
        self.load(comments);
        Ok(count)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker_for(&self, id: &CommentId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.comment == id)
    }

    /// True when the comment list changed since the last marker sync
    pub fn markers_stale(&self) -> bool {
        self.markers_stale
    }

    /// Force a marker rebuild on the next sync (e.g. after a geometry change)
    pub fn invalidate_markers(&mut self) {
        self.markers_stale = true;
    }

    /// Rebuild markers if stale
    pub fn refresh_markers(&mut self, engine: &mut dyn SceneEngine, resolver: &SurfaceAnchorResolver) {
        if self.markers_stale {
            self.sync_markers(engine, resolver);
        }
    }

    /// Dispose every marker, then create one per anchored comment at its
    /// anchor projected onto the surface
    pub fn sync_markers(&mut self, engine: &mut dyn SceneEngine, resolver: &SurfaceAnchorResolver) {
        self.clear_markers(engine);

        for comment in &self.comments {
            let Some(anchor) = comment.anchor else {
                continue;
            };
            let position = resolver.project_point_to_surface(anchor);
            let handle = engine.add_object(
                SceneObject::new(ObjectKind::CommentMarker, position).with_color(MARKER_COLOR),
            );
            self.markers.push(Marker {
                comment: comment.id.clone(),
                handle,
                position,
            });
        }

        self.markers_stale = false;
        log::debug!("Markers synced: {} of {} comments", self.markers.len(), self.comments.len());
    }

    /// Remove every marker object from the engine
    pub fn clear_markers(&mut self, engine: &mut dyn SceneEngine) {
        for marker in self.markers.drain(..) {
            engine.remove_object(marker.handle);
        }
        self.markers_stale = true;
    }
}

fn persistence(error: SiteviewError) -> SiteviewError {
    match error {
        SiteviewError::Persistence(_) => error,
        other => SiteviewError::Persistence(other.to_string()),
    }
}
