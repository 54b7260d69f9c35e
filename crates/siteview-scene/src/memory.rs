//! In-memory scene engine loaded from a JSON scene document

use crate::camera::Camera;
use crate::engine::{EngineCall, ObjectHandle, SceneEngine, SceneObject};
use crate::mesh::{SceneMaterial, SceneMesh};
use crate::raw::{PropertySet, RawNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use siteview_core::{ElementId, Result, SiteviewError};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Serialized form of a loaded model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub spatial_structure: Option<Value>,
    /// Element parentage, independent of the spatial structure
    #[serde(default)]
    pub element_children: HashMap<ElementId, Vec<ElementId>>,
    #[serde(default)]
    pub properties: HashMap<ElementId, Vec<PropertySet>>,
    #[serde(default)]
    pub meshes: Vec<SceneMesh>,
    #[serde(default)]
    pub materials: Vec<SceneMaterial>,
    #[serde(default)]
    pub camera: Option<Camera>,
}

/// A complete [`SceneEngine`] held in memory.
///
/// Every state-changing call is appended to a journal so callers can check
/// the order in which Siteview drives the engine.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    structure: Option<Value>,
    element_children: HashMap<ElementId, Vec<ElementId>>,
    properties: HashMap<ElementId, Vec<PropertySet>>,
    meshes: Vec<SceneMesh>,
    materials: Vec<SceneMaterial>,
    camera: Option<Camera>,
    loaded: bool,
    disposed: bool,
    known: HashSet<ElementId>,
    hidden: HashSet<ElementId>,
    objects: BTreeMap<ObjectHandle, SceneObject>,
    next_handle: u64,
    render_requests: usize,
    journal: Vec<EngineCall>,
    failing_lookups: HashSet<ElementId>,
}

impl MemoryEngine {
    /// An engine with nothing loaded and no camera
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let doc: SceneDocument = serde_json::from_slice(bytes)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: SceneDocument) -> Self {
        let mut known = HashSet::new();
        if let Some(root) = doc.spatial_structure.as_ref().and_then(|v| RawNode::from_value(v).ok()) {
            collect_ids(&root, &mut known);
        }
        for (parent, children) in &doc.element_children {
            known.insert(*parent);
            known.extend(children.iter().copied());
        }
        known.extend(doc.meshes.iter().filter_map(|m| m.element_id));

        log::debug!(
            "Scene document loaded: {} elements, {} meshes, {} materials",
            known.len(),
            doc.meshes.len(),
            doc.materials.len()
        );

        Self {
            structure: doc.spatial_structure,
            element_children: doc.element_children,
            properties: doc.properties,
            meshes: doc.meshes,
            materials: doc.materials,
            camera: doc.camera,
            loaded: true,
            known,
            ..Default::default()
        }
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn without_camera(mut self) -> Self {
        self.camera = None;
        self
    }

    /// Swap the loaded geometry (e.g. after a model edit)
    pub fn replace_meshes(&mut self, meshes: Vec<SceneMesh>) {
        self.known.extend(meshes.iter().filter_map(|m| m.element_id));
        self.meshes = meshes;
    }

    /// Make property lookups that include `id` fail
    pub fn fail_property_lookup(&mut self, id: ElementId) {
        self.failing_lookups.insert(id);
    }

    pub fn journal(&self) -> &[EngineCall] {
        &self.journal
    }

    pub fn render_requests(&self) -> usize {
        self.render_requests
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.get(&handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &SceneObject)> {
        self.objects.iter().map(|(h, o)| (*h, o))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All element ids the engine knows about, sorted
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.known.iter().copied().collect();
        ids.sort();
        ids
    }
}

fn collect_ids(node: &RawNode, out: &mut HashSet<ElementId>) {
    if let Some(id) = node.element_id {
        out.insert(id);
    }
    for child in &node.children {
        collect_ids(child, out);
    }
}

impl SceneEngine for MemoryEngine {
    fn is_model_loaded(&self) -> bool {
        self.loaded && !self.disposed
    }

    fn spatial_structure(&self) -> Option<Value> {
        if self.disposed {
            return None;
        }
        self.structure.clone()
    }

    fn items_children(&self, ids: &[ElementId]) -> Result<Vec<ElementId>> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(children) = self.element_children.get(id) {
                out.extend(children.iter().copied());
            }
        }
        Ok(out)
    }

    fn properties(&self, ids: &[ElementId]) -> Result<Vec<PropertySet>> {
        if let Some(id) = ids.iter().find(|id| self.failing_lookups.contains(id)) {
            return Err(SiteviewError::PropertyLookup {
                element: id.raw(),
                reason: "property query rejected".to_string(),
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.properties.get(id))
            .flatten()
            .cloned()
            .collect())
    }

    fn set_elements_visible(&mut self, ids: &[ElementId], visible: bool) {
        for id in ids {
            self.known.insert(*id);
            if visible {
                self.hidden.remove(id);
            } else {
                self.hidden.insert(*id);
            }
        }
        self.journal.push(EngineCall::SetVisible {
            count: ids.len(),
            visible,
        });
    }

    fn is_element_visible(&self, id: ElementId) -> Option<bool> {
        self.known.contains(&id).then(|| !self.hidden.contains(&id))
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
        self.journal.push(EngineCall::Render);
    }

    fn meshes(&self) -> &[SceneMesh] {
        &self.meshes
    }

    fn materials(&self) -> &[SceneMaterial] {
        &self.materials
    }

    fn materials_mut(&mut self) -> &mut [SceneMaterial] {
        &mut self.materials
    }

    fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    fn add_object(&mut self, object: SceneObject) -> ObjectHandle {
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.objects.insert(handle, object);
        self.journal.push(EngineCall::AddObject(handle));
        handle
    }

    fn update_object(&mut self, handle: ObjectHandle, object: SceneObject) -> bool {
        match self.objects.get_mut(&handle) {
            Some(slot) => {
                *slot = object;
                true
            }
            None => false,
        }
    }

    fn remove_object(&mut self, handle: ObjectHandle) -> bool {
        let removed = self.objects.remove(&handle).is_some();
        if removed {
            self.journal.push(EngineCall::RemoveObject(handle));
        }
        removed
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.objects.clear();
        self.meshes.clear();
        self.materials.clear();
        self.camera = None;
        self.disposed = true;
        self.journal.push(EngineCall::Dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ObjectKind;
    use serde_json::json;
    use siteview_core::Vec3;

    fn sample() -> MemoryEngine {
        let doc = json!({
            "spatial_structure": {
                "localId": 1, "category": "IFCPROJECT",
                "children": [{ "localId": 2, "category": "IFCWALL" }]
            },
            "element_children": { "2": [3, 4] },
            "properties": {
                "2": [{ "name": "Pset_WallCommon", "properties": [{ "name": "Reference", "value": "W-01" }] }]
            },
            "meshes": [{ "element_id": 3, "positions": [[0,0,0],[1,0,0],[0,1,0]], "indices": [[0,1,2]] }],
            "materials": [{ "name": "concrete" }],
            "camera": { "position": { "x": 0, "y": 0, "z": 10 }, "target": { "x": 0, "y": 0, "z": 0 } }
        });
        MemoryEngine::from_json(doc.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_document_loads() {
        let engine = sample();
        assert!(engine.is_model_loaded());
        assert_eq!(engine.element_ids(), vec![ElementId(1), ElementId(2), ElementId(3), ElementId(4)]);
        assert_eq!(engine.items_children(&[ElementId(2)]).unwrap(), vec![ElementId(3), ElementId(4)]);
        assert_eq!(engine.properties(&[ElementId(2)]).unwrap().len(), 1);
        assert!(engine.camera().is_some());
        assert_eq!(engine.meshes().len(), 1);
    }

    #[test]
    fn test_visibility_is_tracked() {
        let mut engine = sample();
        assert_eq!(engine.is_element_visible(ElementId(3)), Some(true));
        engine.set_elements_visible(&[ElementId(3), ElementId(4)], false);
        assert_eq!(engine.is_element_visible(ElementId(3)), Some(false));
        assert_eq!(engine.is_element_visible(ElementId(99)), None);
        assert_eq!(engine.render_requests(), 0);
    }

    #[test]
    fn test_failing_property_lookup() {
        let mut engine = sample();
        engine.fail_property_lookup(ElementId(2));
        let err = engine.properties(&[ElementId(2)]).unwrap_err();
        assert!(matches!(err, SiteviewError::PropertyLookup { element: 2, .. }));
    }

    #[test]
    fn test_objects_and_dispose_journal() {
        let mut engine = sample();
        let h = engine.add_object(SceneObject::new(ObjectKind::CommentMarker, Vec3::ZERO));
        assert!(engine.update_object(h, SceneObject::new(ObjectKind::CommentMarker, Vec3::ONE)));
        assert_eq!(engine.object(h).unwrap().position, Vec3::ONE);
        assert!(engine.remove_object(h));
        assert!(!engine.remove_object(h));
        engine.dispose();
        engine.dispose();

        assert!(!engine.is_model_loaded());
        assert_eq!(
            engine.journal(),
            &[EngineCall::AddObject(h), EngineCall::RemoveObject(h), EngineCall::Dispose]
        );
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            MemoryEngine::from_json(b"{ not json"),
            Err(SiteviewError::Json(_))
        ));
    }
}
