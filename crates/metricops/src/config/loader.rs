//! Loads a configuration directory tree into a [`RawConfig`].
//!
//! Layout:
//!
//! ```text
//! config/
//!   template_values.yaml        # or template_values/*.yaml
//!   metrics/**/*.yaml           # one definition or an array per file
//!   spaces/**/*.json
//!   alerts/ services/ sources/
//!   outdated/metrics/**/*.yaml  # names or definitions to delete
//! ```

use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::error::{ConfigError, Result};
use super::raw::RawConfig;
use crate::model::ResourceKind;
use crate::template::TemplateValues;

const TEMPLATE_VALUES: &str = "template_values";
const OUTDATED: &str = "outdated";

/// Where a file's content belongs in the raw tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Resources(ResourceKind),
    Outdated(ResourceKind),
    TemplateValues,
}

/// Configuration loader for a directory of definition files.
pub struct ConfigLoader {
    /// Root directory for configuration files.
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new config loader for the given directory.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Returns the config directory path.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads every definition file below the config directory.
    ///
    /// Files are visited in sorted path order so the resulting lists are
    /// stable between runs.
    pub fn load(&self) -> Result<RawConfig> {
        if !self.config_dir.is_dir() {
            return Err(ConfigError::ConfigDirNotFound(self.config_dir.clone()));
        }

        let mut raw = RawConfig::default();

        for entry in WalkDir::new(&self.config_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.config_dir) else {
                continue;
            };

            // Skip hidden files and anything inside hidden directories
            let has_hidden_component = relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| s.starts_with('.'))
                    .unwrap_or(false)
            });
            if has_hidden_component {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !matches!(ext, "json" | "yaml" | "yml") {
                continue;
            }

            let Some(target) = route(relative) else {
                log::debug!("Ignoring {}: not under a known section", relative.display());
                continue;
            };

            let document = self.load_file(path)?;
            if document.is_null() {
                log::debug!("Skipping empty file {}", relative.display());
                continue;
            }

            match target {
                Target::Resources(kind) => raw.resources.append(kind, document),
                Target::Outdated(kind) => raw.outdated.append(kind, document),
                Target::TemplateValues => {
                    let values: TemplateValues = serde_json::from_value(document).map_err(|e| {
                        ConfigError::InvalidTemplateValues {
                            path: relative.to_path_buf(),
                            message: e.to_string(),
                        }
                    })?;
                    raw.template_values.extend(values);
                }
            }
        }

        log::debug!(
            "Loaded config from {} ({} template variable(s))",
            self.config_dir.display(),
            raw.template_values.len()
        );

        Ok(raw)
    }

    /// Reads and parses a single JSON or YAML file.
    pub fn load_file(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        parse_document(&content, path)
    }
}

/// Parses file content according to its extension.
pub fn parse_document(content: &str, path: &Path) -> Result<Value> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn route(relative: &Path) -> Option<Target> {
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    match parts.as_slice() {
        [file] => {
            let stem = Path::new(file).file_stem().and_then(|s| s.to_str());
            (stem == Some(TEMPLATE_VALUES)).then_some(Target::TemplateValues)
        }
        [TEMPLATE_VALUES, ..] => Some(Target::TemplateValues),
        [OUTDATED, section, _, ..] => section_kind(section).map(Target::Outdated),
        [section, _, ..] => section_kind(section).map(Target::Resources),
        [] => None,
    }
}

fn section_kind(section: &str) -> Option<ResourceKind> {
    ResourceKind::configurable()
        .iter()
        .copied()
        .find(|kind| kind.collection() == section)
}
