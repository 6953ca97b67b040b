//! Schema node model.
//!
//! Schema documents are loaded as `serde_json::Value` and converted into a
//! closed [`SchemaNode`] tree so resolution, flattening and layout can match
//! exhaustively instead of probing JSON shapes.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Insertion-ordered map of named child nodes.
pub type NodeMap = IndexMap<String, SchemaNode>;

/// Keywords that the layout walk passes through without rendering them.
pub const JUMP_KEYS: &[&str] = &["allOf", "if", "then", "items"];

/// Field types rendered as a single text input.
pub const TEXT_TYPES: &[&str] = &["string", "number", "integer"];

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A `$ref` pointer, either pending resolution or marking a failed one.
#[derive(Debug, Clone, PartialEq)]
pub struct RefNode {
    /// The reference exactly as written in the schema.
    pub target: String,
    /// Why resolution failed. `None` while the reference is still pending.
    pub error: Option<String>,
    /// Keys written next to `$ref` in the same object.
    pub siblings: NodeMap,
}

impl RefNode {
    pub fn pending(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            error: None,
            siblings: NodeMap::new(),
        }
    }

    /// Build an inline error marker for a reference that could not be resolved.
    pub fn unresolved(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            error: Some(reason.into()),
            siblings: NodeMap::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One node of a schema document.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Scalar value: string, number, boolean or null.
    Leaf(Value),
    Object(NodeMap),
    Array(Vec<SchemaNode>),
    Ref(RefNode),
}

impl Default for SchemaNode {
    fn default() -> Self {
        SchemaNode::Object(NodeMap::new())
    }
}

impl SchemaNode {
    /// Convert a JSON value, turning every object with a string `$ref` into a [`RefNode`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(target)) = map.get("$ref") {
                    let siblings = map
                        .iter()
                        .filter(|(k, _)| k.as_str() != "$ref")
                        .map(|(k, v)| (k.clone(), SchemaNode::from_value(v)))
                        .collect();
                    return SchemaNode::Ref(RefNode {
                        target: target.clone(),
                        error: None,
                        siblings,
                    });
                }
                SchemaNode::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), SchemaNode::from_value(v)))
                        .collect(),
                )
            }
            Value::Array(items) => SchemaNode::Array(items.iter().map(Self::from_value).collect()),
            other => SchemaNode::Leaf(other.clone()),
        }
    }

    /// Convert back to JSON. Error markers become `{"$ref": ..., "error": ...}`.
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Leaf(v) => v.clone(),
            SchemaNode::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            SchemaNode::Array(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            SchemaNode::Ref(r) => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), Value::String(r.target.clone()));
                match &r.error {
                    Some(reason) => {
                        map.insert("error".to_string(), Value::String(reason.clone()));
                    }
                    None => {
                        for (k, v) in &r.siblings {
                            map.insert(k.clone(), v.to_value());
                        }
                    }
                }
                Value::Object(map)
            }
        }
    }

    pub fn as_object(&self) -> Option<&NodeMap> {
        match self {
            SchemaNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SchemaNode]> {
        match self {
            SchemaNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SchemaNode::Leaf(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Returns the error marker carried by this node, if any.
    pub fn as_error_marker(&self) -> Option<&RefNode> {
        match self {
            SchemaNode::Ref(r) if r.is_error() => Some(r),
            _ => None,
        }
    }

    /// Visit every error marker in the tree, depth-first.
    pub fn for_each_marker<'a>(&'a self, f: &mut impl FnMut(&'a RefNode)) {
        match self {
            SchemaNode::Ref(r) => {
                if r.is_error() {
                    f(r);
                }
                for child in r.siblings.values() {
                    child.for_each_marker(f);
                }
            }
            SchemaNode::Object(map) => {
                for child in map.values() {
                    child.for_each_marker(f);
                }
            }
            SchemaNode::Array(items) => {
                for child in items {
                    child.for_each_marker(f);
                }
            }
            SchemaNode::Leaf(_) => {}
        }
    }
}

/// Read accessors for the descriptor keys of a field map.
pub trait FieldDescriptor {
    /// The declared `type`. For a list such as `["string", "null"]` the first
    /// non-null entry is returned.
    fn field_type(&self) -> Option<&str>;
    fn enum_options(&self) -> Option<Vec<String>>;
    fn description(&self) -> Option<&str>;
    fn examples(&self) -> Vec<String>;
    fn title(&self) -> Option<&str>;
    fn max_length(&self) -> Option<usize>;
}

impl FieldDescriptor for NodeMap {
    fn field_type(&self) -> Option<&str> {
        match self.get("type")? {
            SchemaNode::Leaf(Value::String(s)) => Some(s),
            SchemaNode::Array(types) => types
                .iter()
                .filter_map(SchemaNode::as_str)
                .find(|t| *t != "null"),
            _ => None,
        }
    }

    fn enum_options(&self) -> Option<Vec<String>> {
        let items = self.get("enum")?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|item| match item {
                    SchemaNode::Leaf(Value::Null) => None,
                    SchemaNode::Leaf(Value::String(s)) => Some(s.clone()),
                    SchemaNode::Leaf(other) => Some(other.to_string()),
                    _ => None,
                })
                .collect(),
        )
    }

    fn description(&self) -> Option<&str> {
        self.get("description")
            .and_then(SchemaNode::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn examples(&self) -> Vec<String> {
        match self.get("examples") {
            Some(SchemaNode::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    SchemaNode::Leaf(Value::String(s)) => Some(s.clone()),
                    SchemaNode::Leaf(Value::Null) => None,
                    SchemaNode::Leaf(other) => Some(other.to_string()),
                    other => Some(other.to_value().to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(SchemaNode::Leaf(Value::String(s))) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    fn title(&self) -> Option<&str> {
        self.get("title").and_then(SchemaNode::as_str)
    }

    fn max_length(&self) -> Option<usize> {
        match self.get("maxLength")? {
            SchemaNode::Leaf(Value::Number(n)) => n.as_u64().map(|n| n as usize),
            _ => None,
        }
    }
}

/// `first_name` / `firstName` -> `First Name`.
pub fn title_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
