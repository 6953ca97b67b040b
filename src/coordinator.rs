//! Form generation entry point: schema lookup, parsing and layout for one form.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::{FormCatalog, FormSource};
use crate::error::{GenerateError, RenderError};
use crate::flatten::default_excluded_keys;
use crate::layout::{output_stem, unique_output_path, Canvas, Generator, LayoutSettings};
use crate::parser::JsonParser;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaNode;

/// Ties a schema registry and a form configuration source together.
///
/// The registry is built once and only read afterwards; each generation
/// gets its own [`Generator`] and render cursor.
pub struct Coordinator<S: FormSource = FormCatalog> {
    registry: SchemaRegistry,
    source: S,
    settings: LayoutSettings,
    excluded_keys: BTreeSet<String>,
}

impl<S: FormSource> Coordinator<S> {
    pub fn new(registry: SchemaRegistry, source: S) -> Self {
        Self {
            registry,
            source,
            settings: LayoutSettings::default(),
            excluded_keys: default_excluded_keys(),
        }
    }

    pub fn settings(mut self, settings: LayoutSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn excluded_keys(mut self, excluded: BTreeSet<String>) -> Self {
        self.excluded_keys = excluded;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Schema id used for `form`: the configured one, else the form id.
    fn schema_id(&self, form: &str) -> String {
        self.source.config(form).schema.unwrap_or_else(|| form.to_string())
    }

    /// Resolved, flattened and cleaned property tree for `form`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::SchemaUnavailable` if the schema cannot be parsed.
    pub fn form_tree(&self, form: &str) -> Result<SchemaNode, GenerateError> {
        JsonParser::new(&self.registry)
            .excluded_keys(self.excluded_keys.clone())
            .parse(&self.schema_id(form))
            .map_err(|source| GenerateError::SchemaUnavailable {
                form: form.to_string(),
                source,
            })
    }

    /// Lay out `form` without writing it anywhere.
    pub fn render(&self, form: &str) -> Result<Canvas, GenerateError> {
        let tree = self.form_tree(form)?;
        let config = self.source.config(form);
        let fee = self.source.fee(form);

        let mut generator = Generator::new(form, &config, fee, &self.settings);
        generator.render(&tree)?;
        Ok(generator.into_canvas())
    }

    /// Generate `form` into `out_dir`, never overwriting an existing file.
    ///
    /// Returns the path written.
    pub fn generate(&self, form: &str, out_dir: &Path) -> Result<PathBuf, GenerateError> {
        let canvas = self.render(form)?;
        std::fs::create_dir_all(out_dir).map_err(|source| RenderError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let path = unique_output_path(out_dir, &output_stem(form));
        canvas.save(&path)?;
        info!(
            "wrote {} ({} page(s)) to {}",
            form,
            canvas.page_count(),
            path.display()
        );
        Ok(path)
    }

    /// Generate `form` as PDF bytes.
    pub fn generate_bytes(&self, form: &str) -> Result<Vec<u8>, GenerateError> {
        Ok(self.render(form)?.to_bytes()?)
    }
}
