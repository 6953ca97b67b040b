//! Schema registry: every schema document in a directory, indexed by `$id`.
//!
//! Besides the id index, the registry records in which document each local
//! pointer (`#/...`) was observed. A local reference met while resolving a
//! different document is looked up through that index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, error, warn};

use crate::error::LoadError;
use crate::loader::{collect_schema_files, load_schema, lookup_pointer, split_ref, RefParts};
use crate::schema::{NodeMap, RefNode, SchemaNode};

/// One loaded schema file.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub id: String,
    pub path: PathBuf,
    pub root: SchemaNode,
}

/// Result of resolving one reference: the target node and the id of the
/// document it was taken from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub node: SchemaNode,
    pub source: String,
}

/// Read-only index of schema documents.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    documents: IndexMap<String, SchemaDocument>,
    local_index: HashMap<String, String>,
    /// Load failures, kept so a later parse of that file can report them.
    failures: Vec<(PathBuf, LoadError)>,
    tolerant_pointers: bool,
}

impl SchemaRegistry {
    /// Create an empty registry. Pointer lookups are tolerant by default.
    pub fn new() -> Self {
        Self {
            tolerant_pointers: true,
            ..Self::default()
        }
    }

    /// Load every `*.json` file below `dir`.
    ///
    /// Files that fail to load are logged and skipped; the rest of the
    /// directory is still indexed.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NotADirectory` if `dir` is not a directory.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let mut registry = Self::new();
        for path in collect_schema_files(dir) {
            match load_schema(&path) {
                Ok(value) => {
                    if let Err(e) = registry.insert_value(&path, &value) {
                        error!("{}", e);
                        registry.failures.push((path, e));
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    registry.failures.push((path, e));
                }
            }
        }

        debug!(
            "loaded {} schema(s) from {}, {} local pointer(s) indexed",
            registry.documents.len(),
            dir.display(),
            registry.local_index.len()
        );
        Ok(registry)
    }

    /// Build a registry from in-memory documents. Used by tests and callers
    /// that already hold parsed JSON.
    pub fn from_values<'a>(
        values: impl IntoIterator<Item = &'a serde_json::Value>,
    ) -> Result<Self, LoadError> {
        let mut registry = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            registry.insert_value(Path::new(&format!("<memory:{}>", i)), value)?;
        }
        Ok(registry)
    }

    /// Choose whether a missing pointer segment yields an empty object
    /// (tolerant, the default) or an error marker.
    pub fn tolerant_pointers(mut self, tolerant: bool) -> Self {
        self.tolerant_pointers = tolerant;
        self
    }

    fn insert_value(&mut self, path: &Path, value: &serde_json::Value) -> Result<(), LoadError> {
        let id = value
            .get("$id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LoadError::MissingId {
                path: path.to_path_buf(),
            })?
            .to_string();

        if let Some(existing) = self.documents.get(&id) {
            warn!(
                "duplicate schema id {} in {} (already loaded from {}), ignoring",
                id,
                path.display(),
                existing.path.display()
            );
            return Ok(());
        }

        let root = SchemaNode::from_value(value);
        record_local_pointers(&root, &id, &mut self.local_index);
        self.documents.insert(
            id.clone(),
            SchemaDocument {
                id,
                path: path.to_path_buf(),
                root,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SchemaDocument> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Schema ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Files that could not be loaded, with the reason.
    pub fn failures(&self) -> &[(PathBuf, LoadError)] {
        &self.failures
    }

    /// Id of the document in which a local pointer (`#/...`) was observed.
    pub fn pointer_owner(&self, pointer: &str) -> Option<&str> {
        self.local_index.get(pointer).map(String::as_str)
    }

    /// Resolve a `$ref` written inside document `current_id`.
    ///
    /// Never fails: problems are returned as an error marker node.
    pub fn resolve(&self, reference: &str, current_id: &str) -> SchemaNode {
        self.resolve_with_source(reference, current_id).node
    }

    /// Like [`resolve`](Self::resolve), also reporting the source document.
    pub fn resolve_with_source(&self, reference: &str, current_id: &str) -> Resolved {
        let unresolved = |reason: String| Resolved {
            node: SchemaNode::Ref(RefNode::unresolved(reference, reason)),
            source: current_id.to_string(),
        };

        match split_ref(reference) {
            RefParts::Document(id) => match self.documents.get(id) {
                Some(doc) => Resolved {
                    node: doc.root.clone(),
                    source: doc.id.clone(),
                },
                None => unresolved(format!("unknown schema id: {}", id)),
            },
            RefParts::Pointer { base, pointer } => {
                let owner = if base.is_empty() {
                    let local = format!("#{}", pointer);
                    self.local_index
                        .get(&local)
                        .map(String::as_str)
                        .unwrap_or(current_id)
                } else {
                    base
                };

                let Some(doc) = self.documents.get(owner) else {
                    return unresolved(format!("unknown schema id: {}", owner));
                };

                match lookup_pointer(&doc.root, pointer) {
                    Some(node) => Resolved {
                        node: node.clone(),
                        source: doc.id.clone(),
                    },
                    None if self.tolerant_pointers => Resolved {
                        node: SchemaNode::Object(NodeMap::new()),
                        source: doc.id.clone(),
                    },
                    None => unresolved(format!("pointer not found in {}: {}", doc.id, pointer)),
                }
            }
            RefParts::Malformed => unresolved("malformed reference: more than one '#'".to_string()),
        }
    }
}

/// Record every local `$ref` in `node` as observed in document `id`.
fn record_local_pointers(node: &SchemaNode, id: &str, index: &mut HashMap<String, String>) {
    match node {
        SchemaNode::Ref(r) => {
            if r.target.starts_with('#') {
                index.insert(r.target.clone(), id.to_string());
            }
            for child in r.siblings.values() {
                record_local_pointers(child, id, index);
            }
        }
        SchemaNode::Object(map) => {
            for child in map.values() {
                record_local_pointers(child, id, index);
            }
        }
        SchemaNode::Array(items) => {
            for child in items {
                record_local_pointers(child, id, index);
            }
        }
        SchemaNode::Leaf(_) => {}
    }
}
