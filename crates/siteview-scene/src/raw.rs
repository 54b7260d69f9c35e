//! Loosely-typed imported structure
//!
//! The import pipeline hands over an arbitrary nested record. Only the
//! fields the hierarchy builder consumes are validated; every other key is
//! kept as a free-form attribute.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use siteview_core::{ElementId, Result, SiteviewError};

const ID_KEYS: &[&str] = &["localId", "expressID", "id"];
const CATEGORY_KEYS: &[&str] = &["category", "type"];
const CHILDREN_KEY: &str = "children";

/// One node of the raw spatial structure
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawNode {
    pub element_id: Option<ElementId>,
    pub category: Option<String>,
    /// Every key not consumed above, including nested attribute objects
    pub attributes: Map<String, Value>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    /// Parse a raw node tree.
    ///
    /// Fails only when the root itself is not a record. Malformed children
    /// are skipped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            SiteviewError::ImportUnavailable(format!(
                "spatial structure root is {}, expected an object",
                kind_of(value)
            ))
        })?;
        Ok(Self::from_object(obj))
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let id_entry = ID_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(parse_element_id).map(|id| (*key, id)));
        let category_entry = CATEGORY_KEYS.iter().find_map(|key| {
            obj.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| (*key, s.to_string()))
        });
        let children = obj.get(CHILDREN_KEY).and_then(Value::as_array);

        let consumed = |key: &str| {
            id_entry.map_or(false, |(k, _)| k == key)
                || category_entry.as_ref().map_or(false, |(k, _)| *k == key)
                || (key == CHILDREN_KEY && children.is_some())
        };
        let attributes = obj
            .iter()
            .filter(|(key, _)| !consumed(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        RawNode {
            element_id: id_entry.map(|(_, id)| id),
            category: category_entry.map(|(_, c)| c),
            attributes,
            children: children
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_object)
                        .map(Self::from_object)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RawNode::count).sum::<usize>()
    }
}

fn parse_element_id(value: &Value) -> Option<ElementId> {
    match value {
        Value::Number(n) => n.as_u64().map(ElementId),
        Value::String(s) => s.trim().parse::<u64>().ok().map(ElementId),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A named group of key/value attributes attached to an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl PropertySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(Property {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}
