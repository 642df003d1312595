use metricops::config::loader::parse_document;
use metricops::{Client, ConfigError, SpaceDefinition, SpaceReconciler};
use std::fs;
use std::path::Path;

use super::{Output, OutputFormat};

/// Prints a space in a form `space apply` accepts.
pub async fn dump(client: &Client, name: &str, format: OutputFormat) -> metricops::Result<Output> {
    let space = SpaceReconciler::new(client).dump(name).await?;
    let value = serde_json::to_value(&space).map_err(ConfigError::from)?;
    Ok(Output::Document(value, format))
}

/// Creates or updates the space described in a JSON or YAML file.
pub async fn apply(client: &Client, file: &Path) -> metricops::Result<Output> {
    let space = read_space(file)?;
    let report = SpaceReconciler::new(client).create_or_update(&space).await?;
    let value = serde_json::to_value(&report).map_err(ConfigError::from)?;
    Ok(Output::json(value))
}

fn read_space(file: &Path) -> Result<SpaceDefinition, ConfigError> {
    let content = fs::read_to_string(file).map_err(|e| ConfigError::ReadFile {
        path: file.to_path_buf(),
        source: e,
    })?;
    let document = parse_document(&content, file)?;
    Ok(serde_json::from_value(document)?)
}
