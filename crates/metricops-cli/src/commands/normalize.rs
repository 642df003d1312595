use metricops::{normalize, ConfigLoader};
use std::path::Path;

use super::Output;

/// Loads and normalizes a config directory without contacting the API.
pub fn run(dir: &Path) -> metricops::Result<Output> {
    let raw = ConfigLoader::new(dir).load()?;
    let canonical = normalize(&raw)?;
    let value = serde_json::to_value(&canonical).map_err(metricops::ConfigError::from)?;
    Ok(Output::json(value))
}
