//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ResourceKind;
use crate::template::TemplateError;

/// Errors in the local configuration.
///
/// These are raised before any request is sent and are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found: {0}")]
    ConfigDirNotFound(PathBuf),

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid template values in '{path}': {message}")]
    InvalidTemplateValues { path: PathBuf, message: String },

    #[error("Invalid {kind} entry #{index}: {message}")]
    InvalidEntry {
        kind: ResourceKind,
        index: usize,
        message: String,
    },

    #[error("Outdated {kind} entry #{index} has no '{field}'")]
    MissingIdentifier {
        kind: ResourceKind,
        index: usize,
        field: &'static str,
    },

    #[error("Only one __default__ metric is allowed, found {count}")]
    MultipleDefaultMetrics { count: usize },

    #[error("empty chart name in space {space}")]
    EmptyChartName { space: String },

    #[error("duplicate chart names in space {space}")]
    DuplicateChartNames { space: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to convert definition: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
