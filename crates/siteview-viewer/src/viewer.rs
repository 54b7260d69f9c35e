//! Model lifecycle and event routing.
//!
//! `ModelViewer` owns the engine for the current model together with
//! everything derived from it: the spatial tree, the surface resolver, the
//! annotation session, and comment markers. Switching models goes through
//! [`ModelViewer::unload`], which tears down in a fixed order so nothing
//! outlives the engine it refers to.

use crate::projection::{screen_to_world_ray, world_to_screen, Viewport};
use crate::session::{GizmoInteractionController, PointerOutcome};
use crossbeam::channel::{unbounded, Receiver, TryRecvError};
use siteview_anchor::{Ray, RayProjection, SurfaceAnchorResolver};
use siteview_annotation::{Anchor, AnnotationStore, Comment, CommentBackend};
use siteview_core::{CommentId, NodeId, PointerButton, Result, SiteviewConfig, SiteviewError, Vec3};
use siteview_hierarchy::{HierarchyBuilder, SpatialTree, TreeRow, TreeView, VisibilityController};
use siteview_scene::SceneEngine;

/// Completion signal from a background import
#[derive(Debug)]
pub enum ImportEvent<E> {
    Loaded(E),
    Failed(SiteviewError),
}

/// Receiving end of an import running on another thread
#[derive(Debug)]
pub struct ImportHandle<E> {
    receiver: Receiver<ImportEvent<E>>,
}

impl<E> ImportHandle<E> {
    /// Non-blocking check for completion
    pub fn try_recv(&self) -> Option<ImportEvent<E>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ImportEvent::Failed(loader_vanished())),
        }
    }

    /// Block until the import finishes
    pub fn wait(self) -> ImportEvent<E> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| ImportEvent::Failed(loader_vanished()))
    }
}

fn loader_vanished() -> SiteviewError {
    SiteviewError::ImportUnavailable("loader thread ended without a result".to_string())
}

/// Run `loader` on a background thread and return a handle to its result
pub fn spawn_import<E, F>(bytes: Vec<u8>, loader: F) -> ImportHandle<E>
where
    E: Send + 'static,
    F: FnOnce(Vec<u8>) -> Result<E> + Send + 'static,
{
    let (sender, receiver) = unbounded();
    std::thread::spawn(move || {
        let size = bytes.len();
        let event = match loader(bytes) {
            Ok(engine) => ImportEvent::Loaded(engine),
            Err(e) => ImportEvent::Failed(e),
        };
        if sender.send(event).is_err() {
            log::debug!("Import of {} bytes finished after its receiver was dropped", size);
        }
    });
    ImportHandle { receiver }
}

/// The viewer for one model at a time
pub struct ModelViewer<E: SceneEngine> {
    config: SiteviewConfig,
    engine: Option<E>,
    tree: Option<SpatialTree>,
    tree_view: TreeView,
    builder: HierarchyBuilder,
    visibility: VisibilityController,
    resolver: SurfaceAnchorResolver,
    gizmo: GizmoInteractionController,
    comments: AnnotationStore,
    listeners_attached: bool,
    import: Option<ImportHandle<E>>,
    viewport: Viewport,
}

impl<E: SceneEngine> ModelViewer<E> {
    pub fn new(config: SiteviewConfig) -> Self {
        Self {
            builder: HierarchyBuilder::new(&config.hierarchy),
            resolver: SurfaceAnchorResolver::new(config.anchor.clone()),
            gizmo: GizmoInteractionController::new(config.gizmo.clone()),
            comments: AnnotationStore::new(&config.comments),
            engine: None,
            tree: None,
            tree_view: TreeView::new(),
            visibility: VisibilityController::new(),
            listeners_attached: false,
            import: None,
            viewport: Viewport::default(),
            config,
        }
    }

    pub fn config(&self) -> &SiteviewConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// `None` when the model had no usable spatial structure
    pub fn tree(&self) -> Option<&SpatialTree> {
        self.tree.as_ref()
    }

    pub fn resolver(&self) -> &SurfaceAnchorResolver {
        &self.resolver
    }

    pub fn gizmo(&self) -> &GizmoInteractionController {
        &self.gizmo
    }

    pub fn comments(&self) -> &AnnotationStore {
        &self.comments
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resize the drawing surface; the camera aspect follows
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(camera) = self.engine.as_mut().and_then(|e| e.camera_mut()) {
            camera.aspect = viewport.aspect();
        }
    }

    // ---- model lifecycle ----

    /// Tear down the current model and start loading the next one off the
    /// main thread. Returns the disposed engine, if there was one.
    pub fn begin_import<F>(&mut self, bytes: Vec<u8>, loader: F) -> Option<E>
    where
        E: Send + 'static,
        F: FnOnce(Vec<u8>) -> Result<E> + Send + 'static,
    {
        let previous = self.unload();
        if self.import.take().is_some() {
            log::warn!("Superseding an import that had not completed");
        }
        log::info!("Importing model ({} bytes)", bytes.len());
        self.import = Some(spawn_import(bytes, loader));
        previous
    }

    pub fn is_importing(&self) -> bool {
        self.import.is_some()
    }

    /// Check for import completion. The tree is only built once the
    /// loaded engine arrives; `None` while still pending or idle.
    pub fn poll_import(&mut self) -> Option<Result<()>> {
        let event = self.import.as_ref()?.try_recv()?;
        self.import = None;
        Some(self.finish_import(event))
    }

    /// Block until the pending import completes
    pub fn wait_import(&mut self) -> Option<Result<()>> {
        let handle = self.import.take()?;
        Some(self.finish_import(handle.wait()))
    }

    fn finish_import(&mut self, event: ImportEvent<E>) -> Result<()> {
        match event {
            ImportEvent::Loaded(engine) => {
                self.load(engine);
                Ok(())
            }
            ImportEvent::Failed(e) => {
                log::error!("Model import failed: {}", e);
                Err(e)
            }
        }
    }

    /// Install a loaded engine, disposing any current one first.
    ///
    /// Builds the resolver and the spatial tree, then attaches pointer
    /// handling. Returns the previous engine.
    pub fn load(&mut self, engine: E) -> Option<E> {
        let previous = self.unload();
        if !engine.is_model_loaded() {
            log::warn!("Engine installed without a loaded model");
        }

        self.resolver.rebuild(engine.meshes());
        self.tree = self.builder.build(&engine);
        if self.tree.is_none() {
            log::info!("Tree panel hidden: no spatial structure");
        }
        self.engine = Some(engine);
        if let Some(camera) = self.engine.as_mut().and_then(|e| e.camera_mut()) {
            camera.aspect = self.viewport.aspect();
        }

        self.listeners_attached = true;
        log::debug!("Pointer listeners attached");
        previous
    }

    /// Tear down the current model.
    ///
    /// Order is fixed: detach listeners, dispose scene overlays (gizmo,
    /// preview, comment markers), then dispose the engine. Returns the
    /// disposed engine.
    pub fn unload(&mut self) -> Option<E> {
        if self.listeners_attached {
            self.listeners_attached = false;
            log::debug!("Pointer listeners detached");
        }

        let mut engine = self.engine.take()?;

        if self.gizmo.exit(&mut engine) {
            log::debug!("Annotation session disposed");
        }
        self.gizmo.take_pending_anchor();
        self.comments.clear_markers(&mut engine);
        log::debug!("Comment markers disposed");

        engine.dispose();
        log::debug!("Engine disposed");

        self.tree = None;
        self.resolver.rebuild(&[]);
        self.comments = AnnotationStore::new(&self.config.comments);
        log::info!("Model unloaded");
        Some(engine)
    }

    /// Re-index geometry after the engine's meshes changed and move
    /// markers onto the new surfaces
    pub fn geometry_changed(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        self.resolver.rebuild(engine.meshes());
        self.comments.invalidate_markers();
        self.comments.refresh_markers(engine, &self.resolver);
    }

    // ---- spatial tree ----

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        self.tree
            .as_ref()
            .map(|tree| self.tree_view.rows(tree))
            .unwrap_or_default()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.tree_view.set_filter(filter);
    }

    pub fn clear_filter(&mut self) {
        self.tree_view.clear_filter();
    }

    pub fn toggle_expanded(&mut self, node: &NodeId) -> Option<bool> {
        let tree = self.tree.as_mut()?;
        self.tree_view.toggle_expanded(tree, node)
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        if let Some(tree) = self.tree.as_mut() {
            self.tree_view.set_all_expanded(tree, expanded);
        }
    }

    /// Show or hide every element under `node`
    pub fn set_node_visible(&mut self, node: &NodeId, visible: bool) -> bool {
        let (Some(tree), Some(engine)) = (self.tree.as_mut(), self.engine.as_mut()) else {
            return false;
        };
        self.visibility.set_visible(tree, engine, node, visible)
    }

    // ---- annotation mode ----

    pub fn enter_annotation_mode(&mut self) -> bool {
        match self.engine.as_mut() {
            Some(engine) => self.gizmo.enter(engine),
            None => false,
        }
    }

    pub fn exit_annotation_mode(&mut self) -> bool {
        match self.engine.as_mut() {
            Some(engine) => self.gizmo.exit(engine),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, pointer: [f32; 2]) -> bool {
        if !self.listeners_attached {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        self.gizmo
            .on_pointer_move(engine, &self.resolver, self.viewport, pointer)
    }

    pub fn pointer_down(&mut self, pointer: [f32; 2], button: PointerButton) -> PointerOutcome {
        if !self.listeners_attached {
            return PointerOutcome::Ignored;
        }
        let Some(engine) = self.engine.as_mut() else {
            return PointerOutcome::Ignored;
        };
        self.gizmo.on_pointer_down(engine, self.viewport, pointer, button)
    }

    pub fn pointer_up(&mut self, button: PointerButton) -> bool {
        self.listeners_attached && self.gizmo.on_pointer_up(button)
    }

    /// True if the host context menu should be suppressed
    pub fn context_menu(&self) -> bool {
        self.listeners_attached && self.gizmo.on_context_menu()
    }

    pub fn cancel_drag(&mut self) -> bool {
        match self.engine.as_mut() {
            Some(engine) => self.gizmo.cancel_drag(engine),
            None => false,
        }
    }

    pub fn take_pending_anchor(&mut self) -> Option<Anchor> {
        self.gizmo.take_pending_anchor()
    }

    // ---- comments ----

    /// Create a comment locally and refresh markers
    pub fn add_comment(&mut self, content: impl Into<String>, anchor: Option<Anchor>) -> Comment {
        let comment = self.comments.create(content, anchor);
        self.sync_markers();
        comment
    }

    /// Create a comment at the anchor confirmed in annotation mode, if any
    pub fn add_comment_at_pending_anchor(&mut self, content: impl Into<String>) -> Comment {
        let anchor = self.gizmo.take_pending_anchor();
        self.add_comment(content, anchor)
    }

    pub fn delete_comment(&mut self, id: &CommentId) -> Result<Comment> {
        let comment = self.comments.delete(id)?;
        self.sync_markers();
        Ok(comment)
    }

    /// Create and persist; on failure the local comment is rolled back
    pub fn add_comment_persisted(
        &mut self,
        backend: &mut dyn CommentBackend,
        content: impl Into<String>,
        anchor: Option<Anchor>,
    ) -> Result<Comment> {
        let result = self.comments.create_persisted(backend, content, anchor);
        self.sync_markers();
        result
    }

    pub fn delete_comment_persisted(&mut self, backend: &mut dyn CommentBackend, id: &CommentId) -> Result<()> {
        let result = self.comments.delete_persisted(backend, id);
        self.sync_markers();
        result
    }

    /// Replace comments with the backend's list and rebuild markers
    pub fn load_comments(&mut self, backend: &dyn CommentBackend) -> Result<usize> {
        let count = self.comments.load_from(backend)?;
        self.sync_markers();
        Ok(count)
    }

    fn sync_markers(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            self.comments.refresh_markers(engine, &self.resolver);
        }
    }

    // ---- projection ----

    pub fn world_to_screen(&self, point: Vec3) -> Option<[f32; 2]> {
        let camera = self.engine.as_ref()?.camera()?;
        world_to_screen(camera, self.viewport, point)
    }

    pub fn pointer_ray(&self, pointer: [f32; 2]) -> Option<Ray> {
        let camera = self.engine.as_ref()?.camera()?;
        Some(screen_to_world_ray(camera, self.viewport, pointer))
    }

    /// Where the pointer lands on the model
    pub fn project_pointer(&self, pointer: [f32; 2]) -> Option<RayProjection> {
        self.pointer_ray(pointer).map(|ray| self.resolver.project_ray(&ray))
    }
}

impl<E: SceneEngine> Drop for ModelViewer<E> {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteview_annotation::MemoryBackend;
    use siteview_scene::{EngineCall, MemoryEngine};

    const SCENE: &str = r#"{
        "spatial_structure": { "localId": 1, "category": "IFCPROJECT", "Name": "Demo", "children": [
            { "localId": 2, "category": "IFCBUILDINGSTOREY", "Name": "Ground", "children": [
                { "localId": 10, "category": "IFCSLAB" }
            ] }
        ] },
        "meshes": [ {
            "element_id": 10,
            "positions": [[-50, 0, -50], [50, 0, -50], [50, 0, 50], [-50, 0, 50]],
            "indices": [[0, 1, 2], [0, 2, 3]],
            "material": 0
        } ],
        "materials": [ { "name": "concrete" } ],
        "camera": { "position": { "x": 0, "y": 5, "z": 20 }, "target": { "x": 0, "y": 5, "z": 0 } }
    }"#;

    fn engine() -> MemoryEngine {
        MemoryEngine::from_json(SCENE.as_bytes()).unwrap()
    }

    fn viewer() -> ModelViewer<MemoryEngine> {
        let mut viewer = ModelViewer::new(SiteviewConfig::default());
        viewer.load(engine());
        viewer
    }

    #[test]
    fn test_load_builds_tree_and_resolver() {
        let viewer = viewer();
        assert!(viewer.listeners_attached());
        assert_eq!(viewer.resolver().mesh_count(), 1);
        let tree = viewer.tree().unwrap();
        assert_eq!(tree.root_node().display_name, "Demo");
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_model_without_structure_has_no_tree() {
        let mut viewer = ModelViewer::new(SiteviewConfig::default());
        let engine = MemoryEngine::from_json(br#"{ "meshes": [] }"#).unwrap();
        viewer.load(engine);
        assert!(viewer.tree().is_none());
        assert!(viewer.tree_rows().is_empty());
    }

    #[test]
    fn test_import_completes_through_poll() {
        let mut viewer: ModelViewer<MemoryEngine> = ModelViewer::new(SiteviewConfig::default());
        viewer.begin_import(SCENE.as_bytes().to_vec(), |bytes| MemoryEngine::from_json(&bytes));
        assert!(viewer.is_importing());
        assert!(viewer.tree().is_none());

        let result = viewer.wait_import().unwrap();
        assert!(result.is_ok());
        assert!(!viewer.is_importing());
        assert!(viewer.tree().is_some());
        assert!(viewer.poll_import().is_none());
    }

    #[test]
    fn test_failed_import_leaves_viewer_empty() {
        let mut viewer: ModelViewer<MemoryEngine> = ModelViewer::new(SiteviewConfig::default());
        viewer.begin_import(b"not json".to_vec(), |bytes| MemoryEngine::from_json(&bytes));
        assert!(viewer.wait_import().unwrap().is_err());
        assert!(!viewer.is_loaded());
        assert!(viewer.tree().is_none());
    }

    #[test]
    fn test_unload_order() {
        let mut viewer = viewer();
        assert!(viewer.enter_annotation_mode());
        viewer.add_comment("Crack", Some(Vec3::new(1.0, 0.5, 1.0)));

        let old = viewer.unload().unwrap();
        assert!(!viewer.listeners_attached());
        assert!(old.is_disposed());

        let journal = old.journal();
        let dispose_at = journal.iter().position(|c| *c == EngineCall::Dispose).unwrap();
        assert_eq!(dispose_at, journal.len() - 1);
        let removed = journal
            .iter()
            .filter(|c| matches!(c, EngineCall::RemoveObject(_)))
            .count();
        // 13 gizmo objects plus one comment marker
        assert_eq!(removed, 14);
        assert!(viewer.comments().is_empty());
    }

    #[test]
    fn test_pointer_hooks_detached_after_unload() {
        let mut viewer = viewer();
        viewer.unload();
        assert!(!viewer.pointer_move([10.0, 10.0]));
        assert_eq!(viewer.pointer_down([10.0, 10.0], PointerButton::Primary), PointerOutcome::Ignored);
        assert!(!viewer.enter_annotation_mode());
    }

    #[test]
    fn test_comment_marker_lands_on_surface() {
        let mut viewer = viewer();
        let comment = viewer.add_comment("Check slab", Some(Vec3::new(2.0, 3.0, -1.0)));
        let marker = viewer.comments().marker_for(&comment.id).unwrap();
        assert!(marker.position.y.abs() < 1e-4);
        assert!((marker.position.x - 2.0).abs() < 1e-4);

        viewer.delete_comment(&comment.id).unwrap();
        assert!(viewer.comments().markers().is_empty());
    }

    #[test]
    fn test_geometry_change_moves_markers() {
        let mut viewer = viewer();
        let comment = viewer.add_comment("Raised", Some(Vec3::new(0.0, 3.0, 0.0)));

        let raised = siteview_scene::SceneMesh::new(
            vec![[-50.0, 2.0, -50.0], [50.0, 2.0, -50.0], [50.0, 2.0, 50.0], [-50.0, 2.0, 50.0]],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        viewer.engine_mut().unwrap().replace_meshes(vec![raised]);
        viewer.geometry_changed();

        let marker = viewer.comments().marker_for(&comment.id).unwrap();
        assert!((marker.position.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_persisted_create_rolls_back_on_failure() {
        let mut viewer = viewer();
        let mut backend = MemoryBackend::new();
        backend.set_failing(true);

        let err = viewer
            .add_comment_persisted(&mut backend, "Lost", Some(Vec3::ZERO))
            .unwrap_err();
        assert!(matches!(err, SiteviewError::Persistence(_)));
        assert!(viewer.comments().is_empty());
        assert!(viewer.comments().markers().is_empty());
    }

    #[test]
    fn test_load_comments_from_backend() {
        let mut viewer = viewer();
        let mut backend = MemoryBackend::new();
        backend.create(&Comment::new("a", Some(Vec3::ZERO), "u1")).unwrap();
        backend.create(&Comment::new("b", None, "u1")).unwrap();

        assert_eq!(viewer.load_comments(&backend).unwrap(), 2);
        assert_eq!(viewer.comments().markers().len(), 1);
    }

    #[test]
    fn test_project_pointer_hits_floor() {
        let viewer = viewer();
        let floor = Vec3::new(3.0, 0.0, 5.0);
        let screen = viewer.world_to_screen(floor).unwrap();
        let projected = viewer.project_pointer(screen).unwrap();
        assert!(projected.is_on_surface());
        assert!(projected.point().y.abs() < 1e-4);

        let sky = viewer.project_pointer([640.0, 0.0]).unwrap();
        assert!(!sky.is_on_surface());
    }
}
