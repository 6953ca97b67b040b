//! Error types for schema loading, form generation and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading schema documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema {path} has no $id")]
    MissingId { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl Clone for LoadError {
    /// I/O and JSON sources are not `Clone`; the copy keeps the variant, the
    /// error kind and the message.
    fn clone(&self) -> Self {
        match self {
            LoadError::FileNotFound { path } => LoadError::FileNotFound { path: path.clone() },
            LoadError::ReadError { path, source } => LoadError::ReadError {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            LoadError::InvalidJson { path, source } => LoadError::InvalidJson {
                path: path.clone(),
                source: <serde_json::Error as serde::de::Error>::custom(source),
            },
            LoadError::MissingId { path } => LoadError::MissingId { path: path.clone() },
            LoadError::NotADirectory { path } => LoadError::NotADirectory { path: path.clone() },
        }
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. }
            | LoadError::ReadError { .. }
            | LoadError::NotADirectory { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while producing the property tree for a form.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown schema id: {id}")]
    UnknownSchema { id: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ParseError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::UnknownSchema { .. } => 2,
            ParseError::Load(e) => e.exit_code(),
        }
    }
}

/// Errors while loading a form configuration catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Read { .. } => 3,
            ConfigError::Invalid { .. } => 2,
        }
    }
}

/// Malformed field path strings (`a.b[0].c`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty segment in field path \"{path}\"")]
    EmptySegment { path: String },

    #[error("unclosed '[' in field path \"{path}\"")]
    UnclosedBracket { path: String },

    #[error("invalid index \"{index}\" in field path \"{path}\"")]
    InvalidIndex { path: String, index: String },
}

/// Errors raised while drawing or writing a PDF. These are fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing or unreadable asset {path}")]
    Asset { path: PathBuf },

    #[error("unsupported image {path}: {message}")]
    Image { path: PathBuf, message: String },
}

/// Errors from a full generation request.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cannot generate {form}: schema could not be parsed")]
    SchemaUnavailable {
        form: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::SchemaUnavailable { source, .. } => source.exit_code(),
            GenerateError::Render(RenderError::Io { .. } | RenderError::Asset { .. }) => 3,
            GenerateError::Render(_) => 2,
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Parse(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
