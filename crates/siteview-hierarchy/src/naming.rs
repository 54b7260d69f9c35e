//! Display-name resolution for raw spatial nodes
//!
//! Names are resolved by a prioritized chain of resolvers. Each one returns
//! `Some(name)` or passes; the first hit wins and the placeholder closes the
//! chain.

use serde_json::{Map, Value};
use siteview_scene::{PropertySet, RawNode, SceneEngine};
use std::cell::OnceCell;

/// Record fields probed for a name, in priority order
const NAME_KEYS: &[&str] = &["Name", "LongName", "name", "displayName", "label"];

/// Property keys that carry a name (case-insensitive substring match)
const NAME_PROPERTY_PATTERNS: &[&str] = &["name", "bezeichnung", "designation", "label", "title"];

/// Property-set names that suggest identity or classification metadata
const IDENTITY_SET_PATTERNS: &[&str] = &["ident", "classif", "common", "element"];

/// Nested attribute objects deeper than this are not searched
const MAX_ATTRIBUTE_DEPTH: usize = 8;

/// Everything a resolver may consult for one node.
///
/// Property sets are fetched from the engine on first use only, so nodes
/// named by their own record never cost a property query.
pub struct NameQuery<'a> {
    pub node: &'a RawNode,
    engine: &'a dyn SceneEngine,
    properties: OnceCell<Option<Vec<PropertySet>>>,
}

impl<'a> NameQuery<'a> {
    pub fn new(node: &'a RawNode, engine: &'a dyn SceneEngine) -> Self {
        Self {
            node,
            engine,
            properties: OnceCell::new(),
        }
    }

    /// Property sets of the node's element, or `None` if it has no element
    /// or the lookup failed
    pub fn property_sets(&self) -> Option<&[PropertySet]> {
        self.properties
            .get_or_init(|| {
                let id = self.node.element_id?;
                match self.engine.properties(&[id]) {
                    Ok(sets) => Some(sets),
                    Err(e) => {
                        log::warn!("Property lookup for element {} failed: {}", id, e);
                        None
                    }
                }
            })
            .as_deref()
    }
}

pub type NameResolver = fn(&NameQuery<'_>) -> Option<String>;

/// Ordered list of name resolvers with a final placeholder
pub struct NameChain {
    resolvers: Vec<(&'static str, NameResolver)>,
    placeholder: String,
}

impl NameChain {
    /// The standard chain: record fields, nested attributes, property sets,
    /// humanized category
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            resolvers: vec![
                ("record", record_name),
                ("attributes", attribute_name),
                ("properties", property_name),
                ("category", category_name),
            ],
            placeholder: placeholder.into(),
        }
    }

    /// A chain with only the placeholder
    pub fn empty(placeholder: impl Into<String>) -> Self {
        Self {
            resolvers: Vec::new(),
            placeholder: placeholder.into(),
        }
    }

    pub fn push(&mut self, label: &'static str, resolver: NameResolver) {
        self.resolvers.push((label, resolver));
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn resolve(&self, query: &NameQuery<'_>) -> String {
        for (label, resolver) in &self.resolvers {
            if let Some(name) = resolver(query) {
                log::trace!("Resolved name {:?} via {}", name, label);
                return name;
            }
        }
        self.placeholder.clone()
    }
}

/// A usable name: a non-empty string, or an object wrapping one in `value`
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn name_in(obj: &Map<String, Value>) -> Option<String> {
    NAME_KEYS.iter().find_map(|key| obj.get(*key).and_then(text_of))
}

/// Name fields on the raw record itself
pub fn record_name(query: &NameQuery<'_>) -> Option<String> {
    name_in(&query.node.attributes)
}

/// Name fields inside nested attribute objects, depth-first
pub fn attribute_name(query: &NameQuery<'_>) -> Option<String> {
    query
        .node
        .attributes
        .iter()
        .filter(|(key, _)| !NAME_KEYS.contains(&key.as_str()))
        .find_map(|(_, value)| search_value(value, 0))
}

fn search_value(value: &Value, depth: usize) -> Option<String> {
    if depth >= MAX_ATTRIBUTE_DEPTH {
        return None;
    }
    match value {
        Value::Object(obj) => name_in(obj).or_else(|| {
            obj.values()
                .find_map(|nested| search_value(nested, depth + 1))
        }),
        Value::Array(items) => items.iter().find_map(|item| search_value(item, depth + 1)),
        _ => None,
    }
}

/// Name-like entries in the element's property sets, identity sets first
pub fn property_name(query: &NameQuery<'_>) -> Option<String> {
    let sets = query.property_sets()?;

    let mut ordered: Vec<&PropertySet> = sets.iter().collect();
    ordered.sort_by_key(|set| !is_identity_set(&set.name));

    ordered.into_iter().find_map(|set| {
        set.properties
            .iter()
            .filter(|p| is_name_property(&p.name))
            .find_map(|p| text_of(&p.value))
    })
}

fn is_identity_set(name: &str) -> bool {
    let lower = name.to_lowercase();
    IDENTITY_SET_PATTERNS.iter().any(|p| lower.contains(p))
}

fn is_name_property(name: &str) -> bool {
    let lower = name.to_lowercase();
    NAME_PROPERTY_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Human-readable form of the category tag
pub fn category_name(query: &NameQuery<'_>) -> Option<String> {
    query.node.category.as_deref().and_then(humanize_category)
}

/// Turn an import category tag into a label.
///
/// `IfcBuildingStorey` becomes `Building Storey`, `IFCWALL` becomes `Wall`.
pub fn humanize_category(category: &str) -> Option<String> {
    let trimmed = category.trim();
    let stripped = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("ifc") => &trimmed[3..],
        _ => trimmed,
    };

    let has_lower = stripped.chars().any(|c| c.is_lowercase());
    let mut words: Vec<String> = Vec::new();

    for part in stripped.split(|c: char| c == '_' || c == '-' || c.is_whitespace()) {
        if part.is_empty() {
            continue;
        }
        if has_lower {
            let mut current = String::new();
            for c in part.chars() {
                if c.is_uppercase() && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
            if !current.is_empty() {
                words.push(current);
            }
        } else {
            words.push(capitalize(&part.to_lowercase()));
        }
    }

    let label = words.join(" ");
    (!label.is_empty()).then_some(label)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteview_core::ElementId;
    use siteview_scene::{MemoryEngine, SceneDocument};

    fn raw(value: Value) -> RawNode {
        RawNode::from_value(&value).unwrap()
    }

    fn engine_with(id: u64, sets: Vec<PropertySet>) -> MemoryEngine {
        let mut doc = SceneDocument::default();
        doc.properties.insert(ElementId(id), sets);
        MemoryEngine::from_document(doc)
    }

    #[test]
    fn test_humanize_category() {
        assert_eq!(humanize_category("IfcBuildingStorey").as_deref(), Some("Building Storey"));
        assert_eq!(humanize_category("IFCWALL").as_deref(), Some("Wall"));
        assert_eq!(humanize_category("IFC_SPACE").as_deref(), Some("Space"));
        assert_eq!(humanize_category("Beam").as_deref(), Some("Beam"));
        assert_eq!(humanize_category("IFC"), None);
        assert_eq!(humanize_category(""), None);
    }

    #[test]
    fn test_record_name_wins() {
        let engine = MemoryEngine::new();
        let node = raw(json!({ "localId": 1, "category": "IFCWALL", "Name": { "value": "Wall A" } }));
        let chain = NameChain::new("Unnamed element");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "Wall A");
    }

    #[test]
    fn test_record_name_priority() {
        let engine = MemoryEngine::new();
        let node = raw(json!({ "label": "third", "LongName": "second", "Name": "" }));
        let chain = NameChain::new("?");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "second");
    }

    #[test]
    fn test_nested_attribute_name() {
        let engine = MemoryEngine::new();
        let node = raw(json!({
            "category": "IFCSLAB",
            "attributes": { "meta": [{ "flags": 1 }, { "name": { "value": "Slab 02" } }] }
        }));
        let chain = NameChain::new("?");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "Slab 02");
    }

    #[test]
    fn test_property_name_prefers_identity_sets() {
        let engine = engine_with(
            7,
            vec![
                PropertySet::new("Dimensions").with("TypeName", "Generic"),
                PropertySet::new("Identity Data").with("Bezeichnung", "Außenwand 1"),
            ],
        );
        let node = raw(json!({ "localId": 7, "category": "IFCWALL" }));
        let chain = NameChain::new("?");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "Außenwand 1");
    }

    #[test]
    fn test_failed_lookup_falls_through_to_category() {
        let mut engine = engine_with(7, vec![PropertySet::new("Pset_Common").with("Name", "x")]);
        engine.fail_property_lookup(ElementId(7));
        let node = raw(json!({ "localId": 7, "category": "IfcBuildingStorey" }));
        let chain = NameChain::new("?");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "Building Storey");
    }

    #[test]
    fn test_placeholder() {
        let engine = MemoryEngine::new();
        let node = raw(json!({ "localId": 9 }));
        let chain = NameChain::new("Unnamed element");
        assert_eq!(chain.resolve(&NameQuery::new(&node, &engine)), "Unnamed element");
        assert_eq!(NameChain::empty("x").resolve(&NameQuery::new(&node, &engine)), "x");
    }
}
