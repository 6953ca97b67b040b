//! Parsing a form's schema into a clean property tree.

use std::collections::BTreeSet;

use log::error;

use crate::error::ParseError;
use crate::flatten::{clean, default_excluded_keys, flatten};
use crate::registry::SchemaRegistry;
use crate::resolver::Resolver;
use crate::schema::SchemaNode;

/// Produces resolved, flattened and cleaned trees from a registry.
pub struct JsonParser<'a> {
    registry: &'a SchemaRegistry,
    excluded: BTreeSet<String>,
}

impl<'a> JsonParser<'a> {
    /// Parser with the default excluded keys.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            excluded: default_excluded_keys(),
        }
    }

    pub fn excluded_keys(mut self, excluded: BTreeSet<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Resolve references only, keeping `properties` and every keyword.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownSchema` when the registry has no such id.
    /// If the id names a file that failed to load, the load error is returned.
    pub fn resolve(&self, schema_id: &str) -> Result<SchemaNode, ParseError> {
        Resolver::new(self.registry)
            .resolve_document(schema_id)
            .ok_or_else(|| self.missing(schema_id))
    }

    /// Resolve, flatten and clean the schema with the given id.
    pub fn parse(&self, schema_id: &str) -> Result<SchemaNode, ParseError> {
        let resolved = self.resolve(schema_id)?;
        Ok(clean(&flatten(&resolved), &self.excluded))
    }

    fn missing(&self, schema_id: &str) -> ParseError {
        // A failed file named after the id is the likely culprit
        let failure = self.registry.failures().iter().find(|(path, _)| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy() == schema_id)
                .unwrap_or(false)
        });

        let err = match failure {
            Some((_, load_error)) => ParseError::Load(load_error.clone()),
            None => ParseError::UnknownSchema {
                id: schema_id.to_string(),
            },
        };
        error!("{}", err);
        err
    }
}
