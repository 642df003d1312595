//! Client library for a hosted metrics service's management API.
//!
//! The interesting part is declarative reconciliation: a directory of
//! metric, space, alert, service and source definitions is
//! [loaded](config::ConfigLoader), [normalized](config::normalize()) into a
//! [`CanonicalConfig`], and [applied](apply::Applier) against an account.

pub mod api;
pub mod apply;
pub mod composite;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod secrets;
pub mod template;
pub mod upsert;

pub use api::{ApiError, Client, ClientConfig, FieldError, ResourceApi, Transport};
pub use apply::{Applier, ApplyError, ApplyReport, ResourceFailure};
pub use composite::Composite;
pub use config::{normalize, CanonicalConfig, ConfigError, ConfigLoader, RawConfig};
pub use error::{MetricOpsError, Result};
pub use model::{
    ChartDefinition, MetricDefinition, RemoteChart, RemoteSpace, ResourceKind, SpaceDefinition,
    Stream,
};
pub use reconcile::{ChartFailure, ChartOp, ReconcileError, SpaceReconciler, SpaceReport};
pub use secrets::{resolve_token, SecretError};
pub use template::{expand_permutations, render, Permutation, TemplateError, TemplateValues};
pub use upsert::{delete_by_identifier, upsert, UpsertOutcome};
