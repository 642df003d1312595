//! Space reconciliation errors.

use serde::Serialize;
use thiserror::Error;

use crate::api::{ApiError, FieldError};
use crate::config::ConfigError;

/// A chart operation issued while reconciling a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartOp {
    Delete,
    Update,
    Create,
}

impl std::fmt::Display for ChartOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartOp::Delete => write!(f, "delete"),
            ChartOp::Update => write!(f, "update"),
            ChartOp::Create => write!(f, "create"),
        }
    }
}

/// One failed chart operation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{op} chart '{chart}': {source}")]
pub struct ChartFailure {
    pub chart: String,
    pub op: ChartOp,
    pub source: ApiError,
}

impl ChartFailure {
    /// Field-level errors reported by the API for this operation.
    pub fn field_errors(&self) -> &[FieldError] {
        self.source.field_errors()
    }
}

/// Errors that can occur while dumping or reconciling a space.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Space not found: {name}")]
    SpaceNotFound { name: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(
        "{} chart operation(s) failed in space {space}: {}",
        failures.len(),
        join_failures(failures)
    )]
    ChartFailures {
        space: String,
        failures: Vec<ChartFailure>,
    },
}

impl ReconcileError {
    /// The individual chart failures, delete first, then update, then create.
    pub fn chart_failures(&self) -> &[ChartFailure] {
        match self {
            ReconcileError::ChartFailures { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn join_failures(failures: &[ChartFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for space reconciliation.
pub type Result<T> = std::result::Result<T, ReconcileError>;
