//! Flattening and cleaning of resolved schema trees.
//!
//! Always applied in the order resolve -> flatten -> clean: flattening can
//! lift an excluded key to a level where cleaning then finds it.

use std::collections::BTreeSet;

use crate::schema::{NodeMap, SchemaNode};

/// Keys removed by default when cleaning a flattened tree.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["$schema", "$id", "required", "additionalProperties"];

/// The default excluded-key set as owned strings.
pub fn default_excluded_keys() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_KEYS.iter().map(|k| k.to_string()).collect()
}

/// Splice every `properties` map into its parent.
///
/// `{"properties": {"a": {...}}}` becomes `{"a": {...}}`. A property that
/// shares its name with a sibling keyword replaces that keyword in place.
pub fn flatten(node: &SchemaNode) -> SchemaNode {
    match node {
        SchemaNode::Object(map) => {
            let mut out = NodeMap::with_capacity(map.len());
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("properties", SchemaNode::Object(props)) => {
                        for (name, prop) in props {
                            out.insert(name.clone(), flatten(prop));
                        }
                    }
                    _ => {
                        out.insert(key.clone(), flatten(value));
                    }
                }
            }
            SchemaNode::Object(out)
        }
        SchemaNode::Array(items) => SchemaNode::Array(items.iter().map(flatten).collect()),
        SchemaNode::Ref(_) | SchemaNode::Leaf(_) => node.clone(),
    }
}

/// Remove every object entry whose key is in `excluded`, recursively.
///
/// List elements that are objects made up only of excluded keys are dropped
/// from the list as well. Error markers are kept as they are.
pub fn clean(node: &SchemaNode, excluded: &BTreeSet<String>) -> SchemaNode {
    match node {
        SchemaNode::Object(map) => SchemaNode::Object(
            map.iter()
                .filter(|(k, _)| !excluded.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), clean(v, excluded)))
                .collect(),
        ),
        SchemaNode::Array(items) => SchemaNode::Array(
            items
                .iter()
                .filter(|item| match item {
                    SchemaNode::Object(m) => !m.keys().all(|k| excluded.contains(k.as_str())),
                    _ => true,
                })
                .map(|item| clean(item, excluded))
                .collect(),
        ),
        SchemaNode::Ref(_) | SchemaNode::Leaf(_) => node.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn node(v: Value) -> SchemaNode {
        SchemaNode::from_value(&v)
    }

    fn keys_anywhere(v: &Value, out: &mut Vec<String>) {
        match v {
            Value::Object(m) => {
                for (k, child) in m {
                    out.push(k.clone());
                    keys_anywhere(child, out);
                }
            }
            Value::Array(items) => items.iter().for_each(|i| keys_anywhere(i, out)),
            _ => {}
        }
    }

    #[test]
    fn flatten_lifts_properties() {
        let out = flatten(&node(json!({
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "object", "properties": { "c": { "type": "integer" } } }
            }
        })));
        assert_eq!(
            out.to_value(),
            json!({
                "type": "object",
                "a": { "type": "string" },
                "b": { "type": "object", "c": { "type": "integer" } }
            })
        );
    }

    #[test]
    fn flatten_recurses_into_lists() {
        let out = flatten(&node(json!({
            "allOf": [ { "properties": { "x": {} } } ]
        })));
        assert_eq!(out.to_value(), json!({ "allOf": [ { "x": {} } ] }));
    }

    #[test]
    fn flatten_is_idempotent() {
        let tree = node(json!({
            "$id": "form",
            "properties": {
                "applicant": {
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                },
                "items": { "type": "array", "items": { "properties": { "qty": {} } } }
            }
        }));
        let once = flatten(&tree);
        assert_eq!(flatten(&once), once);
    }

    #[test]
    fn clean_removes_excluded_keys_everywhere() {
        let tree = node(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "form",
            "required": ["a"],
            "a": {
                "type": "object",
                "required": ["b"],
                "b": { "type": "string", "$id": "inner" },
                "list": [ { "required": ["x"] }, { "$id": "y", "keep": true } ]
            }
        }));
        let excluded = default_excluded_keys();
        let cleaned = clean(&tree, &excluded).to_value();

        let mut keys = Vec::new();
        keys_anywhere(&cleaned, &mut keys);
        for key in &keys {
            assert!(!excluded.contains(key), "{} survived cleaning", key);
        }
        assert_eq!(cleaned["a"]["list"], json!([ { "keep": true } ]));
    }

    #[test]
    fn clean_drops_empty_objects_from_lists() {
        let cleaned = clean(&node(json!({ "l": [ {}, 1, { "a": 1 } ] })), &BTreeSet::new());
        assert_eq!(cleaned.to_value(), json!({ "l": [ 1, { "a": 1 } ] }));
    }

    #[test]
    fn clean_after_flatten_reaches_lifted_keys() {
        // "required" is nested under a property whose name is excluded
        let tree = node(json!({ "properties": { "$schema": { "required": [] }, "a": {} } }));
        let excluded = default_excluded_keys();
        let out = clean(&flatten(&tree), &excluded);
        assert_eq!(out.to_value(), json!({ "a": {} }));
    }
}
