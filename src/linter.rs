//! Schema linting - static analysis of a schema directory.
//!
//! Checks every schema file for:
//! - JSON syntax errors
//! - `$ref` values naming unknown schema ids or missing pointers
//! - malformed references
//! - missing or duplicate `$id`
//! - reference cycles

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::loader::{collect_schema_files, load_schema, lookup_pointer, split_ref, RefParts};
use crate::registry::SchemaRegistry;
use crate::resolver::{Resolver, CIRCULAR_REFERENCE};
use crate::schema::SchemaNode;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/owner/$ref")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Every loadable schema under a base path, used to check cross-file refs.
struct LintContext {
    base: PathBuf,
    registry: SchemaRegistry,
}

impl LintContext {
    fn new(base: &Path) -> Self {
        let dir = if base.is_file() {
            base.parent().unwrap_or(Path::new("."))
        } else {
            base
        };
        let values: Vec<Value> = collect_schema_files(dir)
            .iter()
            .filter_map(|file| load_schema(file).ok())
            .filter(|value| value.get("$id").and_then(Value::as_str).is_some())
            .collect();
        let registry = SchemaRegistry::from_values(&values).unwrap_or_default();
        Self {
            base: base.to_path_buf(),
            registry,
        }
    }

    /// Lint one file. `seen` maps ids to the first file declaring them.
    fn check(&self, file: &Path, seen: &mut HashMap<String, PathBuf>) -> FileResult {
        let mut diagnostics = Vec::new();
        let display = file.strip_prefix(&self.base).unwrap_or(file).to_path_buf();

        let schema = match load_schema(file) {
            Ok(s) => s,
            Err(e) => {
                let message = match &e {
                    LoadError::InvalidJson { source, .. } => format!("syntax error: {}", source),
                    other => other.to_string(),
                };
                diagnostics.push(diagnostic(Severity::Error, "E001", file, "/", message));
                return FileResult {
                    file: display,
                    status: FileStatus::Error,
                    diagnostics,
                };
            }
        };

        let id = schema.get("$id").and_then(Value::as_str);
        let mut owns_id = false;
        match id {
            None => diagnostics.push(diagnostic(
                Severity::Warning,
                "W001",
                file,
                "/",
                "schema missing $id field".to_string(),
            )),
            Some(id) => match seen.get(id) {
                Some(first) => diagnostics.push(diagnostic(
                    Severity::Warning,
                    "W002",
                    file,
                    "/$id",
                    format!("duplicate $id \"{}\" (first declared in {})", id, first.display()),
                )),
                None => {
                    seen.insert(id.to_string(), file.to_path_buf());
                    owns_id = true;
                }
            },
        }

        let root = SchemaNode::from_value(&schema);
        self.check_refs(&schema, &root, file, "", &mut diagnostics);

        if let (Some(id), true) = (id, owns_id) {
            self.check_cycles(id, file, &mut diagnostics);
        }

        let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
        let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

        let status = if has_errors {
            FileStatus::Error
        } else if has_warnings {
            FileStatus::Warning
        } else {
            FileStatus::Ok
        };

        FileResult {
            file: display,
            status,
            diagnostics,
        }
    }

    /// Recursively check $ref values in a schema.
    fn check_refs(
        &self,
        value: &Value,
        root: &SchemaNode,
        file: &Path,
        path: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    let ref_path = format!("{}/$ref", path);
                    if let Some((code, message)) = self.check_single_ref(reference, root) {
                        diagnostics.push(diagnostic(Severity::Error, code, file, &ref_path, message));
                    }
                }

                for (key, val) in map {
                    let child_path = format!("{}/{}", path, key.replace('~', "~0").replace('/', "~1"));
                    self.check_refs(val, root, file, &child_path, diagnostics);
                }
            }
            Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    let child_path = format!("{}/{}", path, i);
                    self.check_refs(item, root, file, &child_path, diagnostics);
                }
            }
            _ => {}
        }
    }

    fn check_single_ref(&self, reference: &str, root: &SchemaNode) -> Option<(&'static str, String)> {
        match split_ref(reference) {
            RefParts::Malformed => Some((
                "E004",
                format!("malformed reference \"{}\": more than one '#'", reference),
            )),
            RefParts::Document(id) => (!self.registry.contains(id))
                .then(|| ("E002", format!("unknown schema id: {}", id))),
            RefParts::Pointer { base, pointer } => {
                if base.is_empty() {
                    // Local pointers may also be served by the file they were observed in
                    let owner = self
                        .registry
                        .pointer_owner(reference)
                        .and_then(|id| self.registry.get(id));
                    let found = lookup_pointer(root, pointer).is_some()
                        || owner.map_or(false, |doc| lookup_pointer(&doc.root, pointer).is_some());
                    return (!found).then(|| ("E003", format!("pointer not found: {}", reference)));
                }
                match self.registry.get(base) {
                    None => Some(("E002", format!("unknown schema id: {}", base))),
                    Some(doc) => lookup_pointer(&doc.root, pointer)
                        .is_none()
                        .then(|| ("E003", format!("pointer not found in {}: #{}", base, pointer))),
                }
            }
        }
    }

    fn check_cycles(&self, id: &str, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
        let Some(resolved) = Resolver::new(&self.registry).resolve_document(id) else {
            return;
        };
        let mut targets = BTreeSet::new();
        resolved.for_each_marker(&mut |marker| {
            if marker.error.as_deref() == Some(CIRCULAR_REFERENCE) {
                targets.insert(marker.target.clone());
            }
        });
        for target in targets {
            diagnostics.push(diagnostic(
                Severity::Warning,
                "W003",
                file,
                "/",
                format!("circular reference through \"{}\"", target),
            ));
        }
    }
}

fn diagnostic(severity: Severity, code: &str, file: &Path, path: &str, message: String) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: path.to_string(),
        message,
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let context = LintContext::new(path);
    let files = collect_schema_files(path);
    let mut seen = HashMap::new();
    let results: Vec<FileResult> = files.iter().map(|f| context.check(f, &mut seen)).collect();

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Lint a single schema file against the schemas under `base_path`.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    LintContext::new(base_path).check(file, &mut HashMap::new())
}
