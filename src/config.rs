//! Per-form render configuration.
//!
//! A [`FormConfig`] says which fixed modules a form carries, in what order its
//! sections render, and how individual fields are labelled and repeated.
//! Forms without a configuration are rendered straight from the schema.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::path::FieldPath;

/// Fee charged when a form declares none.
pub const DEFAULT_FEE: f64 = 0.0;

/// Default date format shown beside date inputs.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

const BUILTIN_FORMS: &str = include_str!("../forms/builtin.json");

/// Fixed drawing routines a form may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Header,
    TopNote,
    Footer,
    Certification,
    EffectiveDate,
}

impl Module {
    /// Parse a module marker as written in `section_order`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "header" => Some(Module::Header),
            "top_note" => Some(Module::TopNote),
            "footer" => Some(Module::Footer),
            "certification" => Some(Module::Certification),
            "effective_date" => Some(Module::EffectiveDate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Header => "header",
            Module::TopNote => "top_note",
            Module::Footer => "footer",
            Module::Certification => "certification",
            Module::EffectiveDate => "effective_date",
        }
    }
}

/// One entry of `section_order`: a module marker or a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEntry {
    Module(Module),
    Field(FieldPath),
}

impl Serialize for SectionEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SectionEntry::Module(m) => serializer.serialize_str(m.as_str()),
            SectionEntry::Field(path) => path.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SectionEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(module) = Module::parse(&s) {
            return Ok(SectionEntry::Module(module));
        }
        s.parse()
            .map(SectionEntry::Field)
            .map_err(serde::de::Error::custom)
    }
}

/// Font variants available for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

/// How one field (and optionally its children) is rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Label text; defaults to the schema title or the title-cased field name.
    pub label: Option<String>,
    pub font: Option<FontStyle>,
    pub font_size: Option<f32>,
    /// How many instances of an array item to lay out.
    pub reps: Option<usize>,
    /// Configs for child fields, keyed by child field name.
    pub children: IndexMap<String, RenderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationConfig {
    pub statement: String,
    /// Labels of the signature-block inputs (e.g. "Name", "Signature").
    pub fields: Vec<String>,
    pub date_format: String,
}

impl Default for CertificationConfig {
    fn default() -> Self {
        Self {
            statement: "I certify that the information provided on this form is true and correct."
                .to_string(),
            fields: vec!["Name".to_string(), "Signature".to_string()],
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopNoteConfig {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterConfig {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectiveDateConfig {
    pub label: String,
    pub date_format: String,
}

impl Default for EffectiveDateConfig {
    fn default() -> Self {
        Self {
            label: "Effective Date".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Configuration for one generable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub title: Option<String>,
    /// Schema id to render; defaults to the form id.
    pub schema: Option<String>,
    pub modules: Vec<Module>,
    pub section_order: Vec<SectionEntry>,
    /// Render configs keyed by field path string.
    pub fields: IndexMap<String, RenderConfig>,
    pub certification: Option<CertificationConfig>,
    pub top_note: Option<TopNoteConfig>,
    pub footer: Option<FooterConfig>,
    pub effective_date: Option<EffectiveDateConfig>,
    /// Image (JPEG or PNG) drawn in the header.
    pub logo: Option<PathBuf>,
    pub fee: Option<f64>,
}

impl FormConfig {
    /// True when nothing is configured; such forms use the schema-only walk.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.modules.is_empty()
            && self.section_order.is_empty()
            && self.fields.is_empty()
    }

    pub fn has_module(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    /// Render config for a field path.
    ///
    /// An exact entry for the index-free path wins; otherwise the first
    /// segment is looked up and the rest followed through `children`.
    pub fn render_config(&self, path: &FieldPath) -> Option<&RenderConfig> {
        let plain = path.without_indices();
        if let Some(cfg) = self.fields.get(&plain.to_string()) {
            return Some(cfg);
        }

        let mut fields = plain.fields();
        let mut current = self.fields.get(fields.next()?)?;
        for name in fields {
            current = current.children.get(name)?;
        }
        Some(current)
    }
}

/// Supplies configuration and fees for forms.
pub trait FormSource {
    /// Config for `form`, or an empty config when none exists.
    fn config(&self, form: &str) -> FormConfig;

    fn fee(&self, form: &str) -> f64;
}

/// Form configurations keyed by form id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormCatalog {
    forms: IndexMap<String, FormConfig>,
}

impl FormCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in catalog.
    pub fn builtin() -> Self {
        // Checked by the builtin_catalog_parses test
        serde_json::from_str(BUILTIN_FORMS).unwrap_or_default()
    }

    /// Load a catalog from a JSON file mapping form id to config.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Add entries from `other`, replacing entries with the same id.
    pub fn extend(&mut self, other: FormCatalog) {
        self.forms.extend(other.forms);
    }

    pub fn insert(&mut self, form: impl Into<String>, config: FormConfig) {
        self.forms.insert(form.into(), config);
    }

    pub fn get(&self, form: &str) -> Option<&FormConfig> {
        self.forms.get(form)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }
}

impl FormSource for FormCatalog {
    fn config(&self, form: &str) -> FormConfig {
        self.forms.get(form).cloned().unwrap_or_default()
    }

    fn fee(&self, form: &str) -> f64 {
        self.forms
            .get(form)
            .and_then(|c| c.fee)
            .unwrap_or(DEFAULT_FEE)
    }
}
