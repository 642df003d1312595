//! Resource kinds and the typed definitions the reconciler works with.
//!
//! Local definitions never carry server-assigned ids. The `Remote*` types
//! wrap a definition together with the id the API knows it by.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Metric,
    Space,
    Chart,
    Alert,
    Service,
    Source,
}

/// How a resource is addressed in request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `/<collection>/<name>`
    ByName,
    /// `/<collection>/<numeric id>`
    ById,
}

impl ResourceKind {
    /// Returns the collection segment used in request paths.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Metric => "metrics",
            ResourceKind::Space => "spaces",
            ResourceKind::Chart => "charts",
            ResourceKind::Alert => "alerts",
            ResourceKind::Service => "services",
            ResourceKind::Source => "sources",
        }
    }

    /// Returns the key holding the items array in a list response.
    pub fn list_key(&self) -> &'static str {
        self.collection()
    }

    /// Returns the field that names a resource of this kind.
    pub fn identifier_field(&self) -> &'static str {
        match self {
            ResourceKind::Service => "title",
            _ => "name",
        }
    }

    pub fn addressing(&self) -> Addressing {
        match self {
            ResourceKind::Metric | ResourceKind::Source => Addressing::ByName,
            _ => Addressing::ById,
        }
    }

    /// Returns the kinds that appear at the top level of a configuration tree.
    pub fn configurable() -> &'static [ResourceKind] {
        &[
            ResourceKind::Metric,
            ResourceKind::Space,
            ResourceKind::Alert,
            ResourceKind::Service,
            ResourceKind::Source,
        ]
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Metric => write!(f, "metric"),
            ResourceKind::Space => write!(f, "space"),
            ResourceKind::Chart => write!(f, "chart"),
            ResourceKind::Alert => write!(f, "alert"),
            ResourceKind::Service => write!(f, "service"),
            ResourceKind::Source => write!(f, "source"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "metrics" => Ok(ResourceKind::Metric),
            "space" | "spaces" => Ok(ResourceKind::Space),
            "chart" | "charts" => Ok(ResourceKind::Chart),
            "alert" | "alerts" => Ok(ResourceKind::Alert),
            "service" | "services" => Ok(ResourceKind::Service),
            "source" | "sources" => Ok(ResourceKind::Source),
            _ => Err(format!("Unknown resource kind: {}", s)),
        }
    }
}

/// A metric definition.
///
/// Only the fields listed here take part in the `__default__` merge;
/// anything else lands in `extra` and is copied whole. Values are kept as
/// given: the API rejects wrong types, not the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,

    /// Reporting interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Value>,

    /// `gauge`, `counter` or `composite`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<Value>,

    /// Composite expression, see [`crate::composite`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_lag: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Name of the metric entry whose fields become defaults for all others.
pub const DEFAULT_METRIC_NAME: &str = "__default__";

impl MetricDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns a copy of `self` with unset fields filled from `defaults`.
    ///
    /// Own values always win; `null` counts as unset. `attributes` is merged
    /// one level deep when both sides are objects; unknown fields are taken
    /// whole from `defaults` when missing here.
    pub fn merged_over(&self, defaults: &MetricDefinition) -> MetricDefinition {
        let attributes = match (&self.attributes, &defaults.attributes) {
            (Some(Value::Object(own)), Some(Value::Object(base))) => {
                let mut merged = base.clone();
                for (key, value) in own {
                    merged.insert(key.clone(), value.clone());
                }
                Some(Value::Object(merged))
            }
            (own, base) => or_default(own, base),
        };

        let mut extra = self.extra.clone();
        for (key, value) in &defaults.extra {
            if !extra.contains_key(key) {
                extra.insert(key.clone(), value.clone());
            }
        }

        MetricDefinition {
            name: self.name.clone(),
            display_name: or_default(&self.display_name, &defaults.display_name),
            description: or_default(&self.description, &defaults.description),
            period: or_default(&self.period, &defaults.period),
            metric_type: or_default(&self.metric_type, &defaults.metric_type),
            composite: or_default(&self.composite, &defaults.composite),
            source_lag: or_default(&self.source_lag, &defaults.source_lag),
            attributes,
            extra,
        }
    }
}

fn or_default(own: &Option<Value>, default: &Option<Value>) -> Option<Value> {
    own.clone().or_else(|| default.clone())
}

/// A space (dashboard) with its charts, addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceDefinition {
    pub name: String,

    #[serde(default)]
    pub charts: Vec<ChartDefinition>,
}

/// A chart inside a space. Charts are matched by name within their space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub streams: Vec<Stream>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One plotted series of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ChartDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Strips server-only fields so the chart can be re-applied elsewhere.
    ///
    /// Removes the chart `id` and `type`, every stream `id`, and a stream's
    /// `composite` when the stream already references a `metric`.
    pub fn into_portable(mut self) -> ChartDefinition {
        self.fields.remove("id");
        self.fields.remove("type");
        for stream in &mut self.streams {
            stream.fields.remove("id");
            if stream.metric.is_some() {
                stream.composite = None;
            }
        }
        self
    }
}

/// A space as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteSpace {
    pub id: u64,
    pub name: String,
}

/// A chart as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteChart {
    pub id: u64,

    #[serde(flatten)]
    pub definition: ChartDefinition,
}

impl RemoteChart {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}
