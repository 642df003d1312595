//! API error types.

use serde_json::Value;
use thiserror::Error;

use crate::model::ResourceKind;

/// Errors returned by calls against the management API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Validation failed ({status}): {}", join_field_errors(.errors))]
    Validation { status: u16, errors: Vec<FieldError> },

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Cannot address {kind} without '{field}'")]
    MissingKey {
        kind: ResourceKind,
        field: &'static str,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns true if the error is likely transient and the call can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request(_) => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns the field-level errors reported by the API, if any.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// A single error reported by the API for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Error category as reported by the API (`params`, `request`, `system`).
    pub category: String,
    /// Offending field, when the API names one.
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}: {}", self.category, field, self.message),
            None => write!(f, "{}: {}", self.category, self.message),
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extracts field errors from an error response body.
///
/// Understands `{"errors": {category: {field: [msg, ..]} | [msg, ..] | msg}}`
/// and `{"errors": [msg, ..]}`.
pub fn parse_field_errors(body: &Value) -> Vec<FieldError> {
    let mut parsed = Vec::new();

    match body.get("errors") {
        Some(Value::Object(categories)) => {
            for (category, detail) in categories {
                match detail {
                    Value::Object(fields) => {
                        for (field, messages) in fields {
                            for message in messages_of(messages) {
                                parsed.push(FieldError {
                                    category: category.clone(),
                                    field: Some(field.clone()),
                                    message,
                                });
                            }
                        }
                    }
                    other => {
                        for message in messages_of(other) {
                            parsed.push(FieldError {
                                category: category.clone(),
                                field: None,
                                message,
                            });
                        }
                    }
                }
            }
        }
        Some(other) => {
            for message in messages_of(other) {
                parsed.push(FieldError {
                    category: "errors".to_string(),
                    field: None,
                    message,
                });
            }
        }
        None => {}
    }

    parsed
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(messages_of).collect(),
        Value::String(message) => vec![message.clone()],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// Result type for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;
