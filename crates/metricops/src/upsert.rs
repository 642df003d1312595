//! Create-or-update and delete of single resources by name.

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, Pagination, ResourceApi};
use crate::model::Addressing;

/// How an [`upsert`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Updated => write!(f, "updated"),
        }
    }
}

/// Creates `definition` or updates the resource with the same name.
///
/// The lookup is by exact name (title for services). A missing resource is
/// created; an existing one is updated through its own key.
pub async fn upsert<P: Pagination>(
    api: &ResourceApi<P>,
    definition: &Value,
) -> Result<UpsertOutcome, ApiError> {
    let identifier = api
        .identifier_of(definition)
        .ok_or_else(|| ApiError::MissingKey {
            kind: api.kind(),
            field: api.kind().identifier_field(),
        })?;

    match api.find_by_identifier(identifier).await {
        Ok(existing) => {
            let key = api.key_of(&existing)?;
            log::debug!("Updating {} '{}' ({})", api.kind(), identifier, key);
            api.update(&key, definition).await?;
            Ok(UpsertOutcome::Updated)
        }
        Err(e) if e.is_not_found() => {
            log::debug!("Creating {} '{}'", api.kind(), identifier);
            api.create(definition).await?;
            Ok(UpsertOutcome::Created)
        }
        Err(e) => Err(e),
    }
}

/// Deletes the resource with the given name (title for services).
///
/// Name-addressed kinds are deleted directly; the others are looked up first
/// to learn their id.
pub async fn delete_by_identifier<P: Pagination>(
    api: &ResourceApi<P>,
    identifier: &str,
) -> Result<(), ApiError> {
    match api.kind().addressing() {
        Addressing::ByName => api.delete(identifier).await,
        Addressing::ById => {
            let existing = api.find_by_identifier(identifier).await?;
            let key = api.key_of(&existing)?;
            api.delete(&key).await
        }
    }
}
