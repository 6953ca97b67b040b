//! Schema loading from files and strings, plus JSON Pointer navigation.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;
use crate::schema::SchemaNode;

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema from a JSON string.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson {
        path: PathBuf::from("<string>"),
        source,
    })
}

/// The parts of a `$ref` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefParts<'a> {
    /// `other-id`: a whole foreign document.
    Document(&'a str),
    /// `other-id#/pointer` or `#/pointer` (empty base).
    Pointer { base: &'a str, pointer: &'a str },
    /// More than one `#`.
    Malformed,
}

/// Split a `$ref` value on `#`.
pub fn split_ref(reference: &str) -> RefParts<'_> {
    let mut parts = reference.split('#');
    let base = parts.next().unwrap_or_default();
    match (parts.next(), parts.next()) {
        (None, _) => RefParts::Document(base),
        (Some(pointer), None) => RefParts::Pointer { base, pointer },
        (Some(_), Some(_)) => RefParts::Malformed,
    }
}

/// Walk a JSON Pointer (e.g. `/properties/foo`, with or without leading `#`).
///
/// Returns `None` as soon as a segment is missing. Callers decide whether a
/// miss is an error or an empty node.
pub fn lookup_pointer<'a>(node: &'a SchemaNode, pointer: &str) -> Option<&'a SchemaNode> {
    let path = pointer.trim_start_matches('#');
    let mut segments = path.split('/');
    // Leading empty segment from "/a/b"
    if path.starts_with('/') {
        segments.next();
    }
    if path.is_empty() {
        return Some(node);
    }

    let mut current = node;
    for part in segments {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            SchemaNode::Object(map) => map.get(&key)?,
            SchemaNode::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            SchemaNode::Ref(r) => r.siblings.get(&key)?,
            SchemaNode::Leaf(_) => return None,
        };
    }
    Some(current)
}

/// Collect all .json files in a path (file or directory), sorted.
pub fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
