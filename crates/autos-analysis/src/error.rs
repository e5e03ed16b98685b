//! Error types for the listing analysis pipeline.
//!
//! Loading and schema problems get their own enums ([`LoadError`] and
//! [`SchemaError`]) so callers can match on them directly; everything is
//! funnelled into [`AnalysisError`] at the pipeline boundary.
//!
//! Errors serialize as `{code, message}` so they can be embedded in JSON
//! output next to a partial report.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the raw listing file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoding label is not one `encoding_rs` knows about.
    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),

    /// The CSV reader rejected the decoded content.
    #[error("Failed to parse '{}': {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The file has no header or no columns.
    #[error("File '{}' contains no columns", .0.display())]
    Empty(PathBuf),
}

/// Problems with the column layout of a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two distinct source columns normalize to the same name.
    #[error("Columns '{first}' and '{second}' both normalize to '{normalized}'")]
    Collision {
        first: String,
        second: String,
        normalized: String,
    },

    /// A header cell is empty after trimming.
    #[error("Column at position {0} has an empty name")]
    EmptyName(usize),

    /// A column required by the analysis is absent.
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),
}

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Reading or decoding the input failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The table columns are unusable.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// A column holds values the requested operation cannot work with.
    #[error("Column '{column}' cannot be used for {operation}: {reason}")]
    UnsupportedColumn {
        column: String,
        operation: String,
        reason: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for scripted consumers of the JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load(LoadError::NotFound(_)) => "FILE_NOT_FOUND",
            Self::Load(LoadError::UnknownEncoding(_)) => "UNKNOWN_ENCODING",
            Self::Load(_) => "LOAD_ERROR",
            Self::Schema(SchemaError::MissingColumn(_)) => "COLUMN_NOT_FOUND",
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnsupportedColumn { .. } => "UNSUPPORTED_COLUMN",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check whether this error came from loading the input.
    pub fn is_load_error(&self) -> bool {
        match self {
            Self::Load(_) => true,
            Self::WithContext { source, .. } => source.is_load_error(),
            _ => false,
        }
    }
}

impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, SchemaError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Schema(e).with_context(context))
    }
}
