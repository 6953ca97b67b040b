//! Reference resolution - replaces `$ref` nodes with their targets and merges `allOf`.

use std::collections::HashSet;

use log::warn;

use crate::registry::SchemaRegistry;
use crate::schema::{NodeMap, RefNode, SchemaNode};

/// Reason carried by the marker that replaces a reference cycle.
pub const CIRCULAR_REFERENCE: &str = "circular reference";

/// Walks one document, dereferencing every `$ref` against a registry.
///
/// Resolution never fails. Unknown ids, bad pointers and cycles are replaced
/// with error markers so the rest of the document still resolves.
pub struct Resolver<'a> {
    registry: &'a SchemaRegistry,
    resolving: HashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            resolving: HashSet::new(),
        }
    }

    /// Resolve the whole document with the given id.
    ///
    /// Returns `None` if no such document is registered.
    pub fn resolve_document(&mut self, id: &str) -> Option<SchemaNode> {
        let root = self.registry.get(id)?.root.clone();
        self.resolving.insert(id.to_string());
        let resolved = self.resolve_node(root, id);
        self.resolving.remove(id);
        Some(resolved)
    }

    /// Resolve every reference inside `node`, which belongs to document `current_id`.
    pub fn resolve_node(&mut self, node: SchemaNode, current_id: &str) -> SchemaNode {
        match node {
            SchemaNode::Ref(r) if r.is_error() => SchemaNode::Ref(r),
            SchemaNode::Ref(r) => self.resolve_ref(r, current_id),
            SchemaNode::Object(map) => {
                let resolved: NodeMap = map
                    .into_iter()
                    .map(|(k, v)| {
                        let v = self.resolve_node(v, current_id);
                        (k, v)
                    })
                    .collect();
                SchemaNode::Object(merge_all_of(resolved))
            }
            SchemaNode::Array(items) => SchemaNode::Array(
                items
                    .into_iter()
                    .map(|item| self.resolve_node(item, current_id))
                    .collect(),
            ),
            leaf @ SchemaNode::Leaf(_) => leaf,
        }
    }

    fn resolve_ref(&mut self, r: RefNode, current_id: &str) -> SchemaNode {
        if self.resolving.contains(&r.target) {
            warn!(
                "circular reference {} while resolving {}",
                r.target, current_id
            );
            return SchemaNode::Ref(RefNode::unresolved(r.target, CIRCULAR_REFERENCE));
        }

        let target = self.registry.resolve_with_source(&r.target, current_id);
        if let Some(marker) = target.node.as_error_marker() {
            warn!(
                "unresolved reference {} in {}: {}",
                marker.target,
                current_id,
                marker.error.as_deref().unwrap_or_default()
            );
            return target.node;
        }

        // Resolve the target first; it may contain further references
        self.resolving.insert(r.target.clone());
        let resolved = self.resolve_node(target.node, &target.source);
        self.resolving.remove(&r.target);

        if r.siblings.is_empty() {
            return resolved;
        }

        // Keys written next to $ref override the target's
        match resolved {
            SchemaNode::Object(mut map) => {
                for (k, v) in r.siblings {
                    let v = self.resolve_node(v, current_id);
                    map.insert(k, v);
                }
                SchemaNode::Object(merge_all_of(map))
            }
            other => other,
        }
    }
}

/// Fold object branches of `allOf` into the parent object.
///
/// Existing keys are never overwritten; `properties` maps are merged entry by
/// entry. Non-object branches (error markers) stay under `allOf`.
pub fn merge_all_of(mut map: NodeMap) -> NodeMap {
    let Some(SchemaNode::Array(branches)) = map.get("allOf").cloned() else {
        return map;
    };

    let mut leftover = Vec::new();
    for branch in branches {
        match branch {
            SchemaNode::Object(branch_map) => {
                for (key, value) in branch_map {
                    match map.get_mut(&key) {
                        Some(SchemaNode::Object(existing)) if key == "properties" => {
                            if let SchemaNode::Object(incoming) = value {
                                for (name, prop) in incoming {
                                    existing.entry(name).or_insert(prop);
                                }
                            }
                        }
                        Some(_) => {}
                        None => {
                            map.insert(key, value);
                        }
                    }
                }
            }
            other => leftover.push(other),
        }
    }

    if leftover.is_empty() {
        map.shift_remove("allOf");
    } else {
        map.insert("allOf".to_string(), SchemaNode::Array(leftover));
    }
    map
}
