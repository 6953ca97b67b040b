//! Fillable PDF forms from multi-file JSON Schema sets.
//!
//! A form is generated in three steps:
//!
//! 1. **Resolve**: every `$ref` in the form's schema is replaced by its target,
//!    whether it names another schema document (`"address"`), a pointer into
//!    one (`"address#/properties/city"`), or a local pointer (`"#/properties/x"`).
//!    Cycles and unresolvable references become inline error markers.
//! 2. **Flatten and clean**: `properties` maps are lifted into their parent and
//!    bookkeeping keys (`$schema`, `$id`, `required`, ...) are removed.
//! 3. **Lay out**: the property tree is walked, optionally in the order a
//!    [`FormConfig`] prescribes, and drawn as text fields, checkboxes, radio
//!    groups and dropdowns across as many pages as needed.
//!
//! # Example
//!
//! ```
//! use formgen::{JsonParser, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::from_values(&[json!({
//!     "$id": "root",
//!     "properties": {
//!         "x": { "$ref": "#/properties/y" },
//!         "y": { "type": "string" }
//!     }
//! })])
//! .unwrap();
//!
//! let tree = JsonParser::new(&registry).parse("root").unwrap();
//! assert_eq!(
//!     tree.to_value(),
//!     json!({ "x": { "type": "string" }, "y": { "type": "string" } })
//! );
//! ```
//!
//! # Enumerated fields
//!
//! | Options | Widget |
//! |---------|--------|
//! | 1 to 4 | Radio group |
//! | 5 or more | Dropdown, with a blank first option |

mod config;
mod coordinator;
mod error;
mod flatten;
pub mod layout;
mod linter;
mod loader;
mod parser;
mod path;
mod registry;
mod resolver;
mod schema;
mod validator;

pub use config::{
    CertificationConfig, EffectiveDateConfig, FontStyle, FooterConfig, FormCatalog, FormConfig,
    FormSource, Module, RenderConfig, SectionEntry, TopNoteConfig, DEFAULT_DATE_FORMAT,
    DEFAULT_FEE,
};
pub use coordinator::Coordinator;
pub use error::{
    ConfigError, GenerateError, LoadError, ParseError, PathError, RenderError, SchemaError,
    ValidateError,
};
pub use flatten::{clean, default_excluded_keys, flatten, DEFAULT_EXCLUDED_KEYS};
pub use layout::{Canvas, LayoutSettings};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{collect_schema_files, load_schema, load_schema_str, lookup_pointer, split_ref, RefParts};
pub use parser::JsonParser;
pub use path::{FieldPath, Segment};
pub use registry::{Resolved, SchemaDocument, SchemaRegistry};
pub use resolver::{merge_all_of, Resolver, CIRCULAR_REFERENCE};
pub use schema::{title_case, FieldDescriptor, NodeMap, RefNode, SchemaNode};
pub use validator::{validate, validate_against_schema};
