use metricops::{normalize, Applier, Client, ConfigLoader};
use std::path::Path;

use super::Output;

/// Loads, normalizes and applies a config directory.
///
/// Config errors surface before the first request is sent.
pub async fn run(client: &Client, dir: &Path) -> metricops::Result<Output> {
    let raw = ConfigLoader::new(dir).load()?;
    let canonical = normalize(&raw)?;

    let report = Applier::new(client).apply(&canonical).await?;
    let value = serde_json::to_value(&report).map_err(metricops::ConfigError::from)?;
    Ok(Output::json(value))
}
