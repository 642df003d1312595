//! The raw configuration tree as produced by the loader.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use super::error::{ConfigError, Result};
use crate::model::ResourceKind;
use crate::template::TemplateValues;

static EMPTY_SECTION: Value = Value::Null;

/// Unnormalized configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    #[serde(flatten)]
    pub resources: RawSections,
    /// Resources slated for deletion.
    pub outdated: RawSections,
    pub template_values: TemplateValues,
}

/// One value per configurable kind.
///
/// Each section is either missing (`null`), a single definition, or an array
/// whose elements are definitions or arrays of definitions (one per file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSections {
    pub metrics: Value,
    pub spaces: Value,
    pub alerts: Value,
    pub services: Value,
    pub sources: Value,
}

impl RawConfig {
    /// Parses a whole configuration from one YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Parses a whole configuration from one JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }
}

impl RawSections {
    /// Returns the section for `kind`. Charts never appear at the top level.
    pub fn section(&self, kind: ResourceKind) -> &Value {
        match kind {
            ResourceKind::Metric => &self.metrics,
            ResourceKind::Space => &self.spaces,
            ResourceKind::Alert => &self.alerts,
            ResourceKind::Service => &self.services,
            ResourceKind::Source => &self.sources,
            ResourceKind::Chart => &EMPTY_SECTION,
        }
    }

    /// Appends one loaded document to the section for `kind`.
    pub fn append(&mut self, kind: ResourceKind, document: Value) {
        let section = match kind {
            ResourceKind::Metric => &mut self.metrics,
            ResourceKind::Space => &mut self.spaces,
            ResourceKind::Alert => &mut self.alerts,
            ResourceKind::Service => &mut self.services,
            ResourceKind::Source => &mut self.sources,
            ResourceKind::Chart => return,
        };

        *section = match std::mem::take(section) {
            Value::Array(mut items) => {
                items.push(document);
                Value::Array(items)
            }
            Value::Null => Value::Array(vec![document]),
            single => Value::Array(vec![single, document]),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_yaml_all_keys_optional() {
        let raw = RawConfig::from_yaml_str("metrics:\n  - name: cpu\n").unwrap();
        assert_eq!(raw.resources.metrics, json!([{"name": "cpu"}]));
        assert_eq!(raw.resources.spaces, Value::Null);
        assert_eq!(raw.outdated.metrics, Value::Null);
        assert!(raw.template_values.is_empty());
    }

    #[test]
    fn test_from_json_with_outdated_and_templates() {
        let raw = RawConfig::from_json_str(
            r#"{
                "outdated": {"metrics": ["old.{{host}}"]},
                "template_values": {"host": ["a", "b"]}
            }"#,
        )
        .unwrap();
        assert_eq!(raw.outdated.metrics, json!(["old.{{host}}"]));
        assert_eq!(raw.template_values.len(), 1);
    }

    #[test]
    fn test_append_wraps_existing_object() {
        let mut sections = RawSections {
            spaces: json!({"name": "a"}),
            ..Default::default()
        };
        sections.append(ResourceKind::Space, json!([{"name": "b"}]));
        sections.append(ResourceKind::Metric, json!({"name": "m"}));

        assert_eq!(sections.spaces, json!([{"name": "a"}, [{"name": "b"}]]));
        assert_eq!(sections.metrics, json!([{"name": "m"}]));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            RawConfig::from_yaml_str("metrics: [unclosed"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
