//! Flattens a raw configuration tree into canonical per-kind lists.
//!
//! Only metrics are templated: they get the `__default__` merge and are
//! expanded over every template permutation, and outdated metric names are
//! rendered the same way. Every other kind is flattened as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::error::{ConfigError, Result};
use super::raw::{RawConfig, RawSections};
use crate::model::{MetricDefinition, ResourceKind, SpaceDefinition, DEFAULT_METRIC_NAME};
use crate::reconcile::validate_space;
use crate::template::{
    expand_permutations, render_all_permutations, render_object_all_permutations, Permutation,
};

/// Metric fields that may contain `{{ }}` placeholders.
pub const METRIC_TEMPLATE_FIELDS: &[&str] = &["name", "display_name", "composite"];

/// Fully expanded configuration, ready to be applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalConfig {
    pub metrics: Vec<MetricDefinition>,
    pub spaces: Vec<SpaceDefinition>,
    pub alerts: Vec<Map<String, Value>>,
    pub services: Vec<Map<String, Value>>,
    pub sources: Vec<Map<String, Value>>,
    pub outdated: OutdatedConfig,
}

/// Identifiers of resources to delete, per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutdatedConfig {
    pub metrics: Vec<String>,
    pub spaces: Vec<String>,
    pub alerts: Vec<String>,
    pub services: Vec<String>,
    pub sources: Vec<String>,
}

impl OutdatedConfig {
    pub fn identifiers(&self, kind: ResourceKind) -> &[String] {
        match kind {
            ResourceKind::Metric => &self.metrics,
            ResourceKind::Space => &self.spaces,
            ResourceKind::Alert => &self.alerts,
            ResourceKind::Service => &self.services,
            ResourceKind::Source => &self.sources,
            ResourceKind::Chart => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::configurable()
            .iter()
            .all(|kind| self.identifiers(*kind).is_empty())
    }
}

/// Normalizes a raw configuration.
///
/// Fails before touching the network on malformed entries, more than one
/// `__default__` metric, a space with an empty or repeated chart name, or a
/// template that does not render.
///
/// A metric entry expands to its distinct rendered permutations. Identical
/// entries written twice are both kept. Metric field values are not
/// type-checked.
pub fn normalize(raw: &RawConfig) -> Result<CanonicalConfig> {
    let permutations = expand_permutations(&raw.template_values);
    if permutations.is_empty() {
        log::warn!("A template variable has no values; templated metrics expand to nothing");
    }

    let resources = &raw.resources;
    let spaces: Vec<SpaceDefinition> = flatten_typed(ResourceKind::Space, &resources.spaces)?;
    for space in &spaces {
        validate_space(space)?;
    }

    let config = CanonicalConfig {
        metrics: normalize_metrics(&resources.metrics, &permutations)?,
        spaces,
        alerts: flatten_objects(ResourceKind::Alert, &resources.alerts)?,
        services: flatten_objects(ResourceKind::Service, &resources.services)?,
        sources: flatten_objects(ResourceKind::Source, &resources.sources)?,
        outdated: normalize_outdated(&raw.outdated, &permutations)?,
    };

    log::debug!(
        "Normalized config: {} metric(s), {} space(s), {} alert(s), {} service(s), {} source(s)",
        config.metrics.len(),
        config.spaces.len(),
        config.alerts.len(),
        config.services.len(),
        config.sources.len()
    );

    Ok(config)
}

/// Flattens one section: `null` becomes empty, a bare value becomes a
/// one-element list, and one level of nested arrays is spliced in.
pub fn flatten(section: &Value) -> Vec<Value> {
    match section {
        Value::Null => Vec::new(),
        Value::Array(items) => {
            let mut flat = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(inner) => flat.extend(inner.iter().cloned()),
                    other => flat.push(other.clone()),
                }
            }
            flat
        }
        other => vec![other.clone()],
    }
}

fn flatten_objects(kind: ResourceKind, section: &Value) -> Result<Vec<Map<String, Value>>> {
    flatten(section)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(object) => Ok(object),
            other => Err(ConfigError::InvalidEntry {
                kind,
                index,
                message: format!("expected an object, found {}", other),
            }),
        })
        .collect()
}

fn flatten_typed<T: serde::de::DeserializeOwned>(
    kind: ResourceKind,
    section: &Value,
) -> Result<Vec<T>> {
    flatten_objects(kind, section)?
        .into_iter()
        .enumerate()
        .map(|(index, object)| {
            serde_json::from_value(Value::Object(object)).map_err(|e| ConfigError::InvalidEntry {
                kind,
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

fn normalize_metrics(
    section: &Value,
    permutations: &[Permutation],
) -> Result<Vec<MetricDefinition>> {
    let (defaults, metrics): (Vec<MetricDefinition>, Vec<MetricDefinition>) =
        flatten_typed::<MetricDefinition>(ResourceKind::Metric, section)?
            .into_iter()
            .partition(|metric| metric.name == DEFAULT_METRIC_NAME);

    if defaults.len() > 1 {
        return Err(ConfigError::MultipleDefaultMetrics {
            count: defaults.len(),
        });
    }
    let defaults = defaults.into_iter().next();

    let mut expanded: Vec<MetricDefinition> = Vec::new();
    for metric in metrics {
        let merged = match &defaults {
            Some(defaults) => metric.merged_over(defaults),
            None => metric,
        };

        let Value::Object(object) = serde_json::to_value(&merged)? else {
            continue;
        };

        // Permutations of one entry are already deduplicated; separate
        // entries are kept even when identical.
        for rendered in
            render_object_all_permutations(&object, METRIC_TEMPLATE_FIELDS, permutations)?
        {
            expanded.push(serde_json::from_value(Value::Object(rendered))?);
        }
    }

    Ok(expanded)
}

fn normalize_outdated(outdated: &RawSections, permutations: &[Permutation]) -> Result<OutdatedConfig> {
    let mut metrics = Vec::new();
    let mut seen = HashSet::new();
    for (index, entry) in flatten(&outdated.metrics).into_iter().enumerate() {
        let names = match entry {
            Value::String(template) => render_all_permutations(&template, permutations)?,
            other => vec![identifier_of(ResourceKind::Metric, index, other)?],
        };
        for name in names {
            if seen.insert(name.clone()) {
                metrics.push(name);
            }
        }
    }

    Ok(OutdatedConfig {
        metrics,
        spaces: outdated_identifiers(ResourceKind::Space, &outdated.spaces)?,
        alerts: outdated_identifiers(ResourceKind::Alert, &outdated.alerts)?,
        services: outdated_identifiers(ResourceKind::Service, &outdated.services)?,
        sources: outdated_identifiers(ResourceKind::Source, &outdated.sources)?,
    })
}

fn outdated_identifiers(kind: ResourceKind, section: &Value) -> Result<Vec<String>> {
    flatten(section)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| identifier_of(kind, index, entry))
        .collect()
}

/// An outdated entry is either the identifier itself or a definition carrying it.
fn identifier_of(kind: ResourceKind, index: usize, entry: Value) -> Result<String> {
    let field = kind.identifier_field();
    match entry {
        Value::String(identifier) => Ok(identifier),
        Value::Object(object) => match object.get(field) {
            Some(Value::String(identifier)) => Ok(identifier.clone()),
            _ => Err(ConfigError::MissingIdentifier { kind, index, field }),
        },
        other => Err(ConfigError::InvalidEntry {
            kind,
            index,
            message: format!("expected a name or an object, found {}", other),
        }),
    }
}
