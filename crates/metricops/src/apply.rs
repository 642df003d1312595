//! Applying a whole canonical configuration.
//!
//! Three stages run strictly one after another:
//!
//! 1. delete outdated metrics, spaces, alerts, services and sources
//! 2. upsert metrics, services and sources
//! 3. reconcile spaces and upsert alerts, which may reference stage 2
//!
//! Inside a stage every operation is issued at once and the stage waits for
//! all of them to settle. A failing operation is recorded and logged; it
//! never stops its siblings or the following stages.

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info_span, Instrument};

use crate::api::{Client, Pagination, ResourceApi};
use crate::config::{CanonicalConfig, OutdatedConfig};
use crate::model::{ResourceKind, SpaceDefinition};
use crate::reconcile::SpaceReconciler;
use crate::upsert::{delete_by_identifier, upsert, UpsertOutcome};

/// The operation that failed for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Delete,
    Upsert,
    Reconcile,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Delete => write!(f, "delete"),
            Action::Upsert => write!(f, "upsert"),
            Action::Reconcile => write!(f, "reconcile"),
        }
    }
}

/// One failed resource operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceFailure {
    pub kind: ResourceKind,
    pub identifier: String,
    pub action: Action,
    pub message: String,
}

impl std::fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} '{}': {}",
            self.action, self.kind, self.identifier, self.message
        )
    }
}

/// Counts of what an apply run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Outdated resources that were deleted.
    pub deleted: usize,
    /// Outdated resources that were already gone.
    pub absent: usize,
    pub created: usize,
    pub updated: usize,
    /// Spaces brought in line with their definition.
    pub reconciled: usize,
}

impl ApplyReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Deleted => self.deleted += 1,
            Outcome::Absent => self.absent += 1,
            Outcome::Upserted(UpsertOutcome::Created) => self.created += 1,
            Outcome::Upserted(UpsertOutcome::Updated) => self.updated += 1,
            Outcome::Reconciled => self.reconciled += 1,
        }
    }
}

/// Errors returned by [`Applier::apply`].
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("{count} resource operation(s) failed")]
    Failed {
        count: usize,
        failures: Vec<ResourceFailure>,
    },
}

impl ApplyError {
    pub fn failures(&self) -> &[ResourceFailure] {
        match self {
            ApplyError::Failed { failures, .. } => failures,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Deleted,
    Absent,
    Upserted(UpsertOutcome),
    Reconciled,
}

type Step<'a> = BoxFuture<'a, Result<Outcome, ResourceFailure>>;

/// Runs the staged apply of a [`CanonicalConfig`].
#[derive(Debug, Clone)]
pub struct Applier {
    client: Client,
    spaces: SpaceReconciler,
}

impl Applier {
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
            spaces: SpaceReconciler::new(client),
        }
    }

    /// Applies `config` and reports what changed.
    ///
    /// Fails with [`ApplyError::Failed`] listing every failed operation if
    /// at least one did not succeed. Successful operations stay applied.
    pub async fn apply(&self, config: &CanonicalConfig) -> Result<ApplyReport, ApplyError> {
        let mut report = ApplyReport::default();
        let mut failures = Vec::new();

        let outdated = self.outdated_steps(&config.outdated);
        let count = outdated.len();
        let results = join_all(outdated)
            .instrument(info_span!("delete_outdated", count))
            .await;
        settle(results, &mut report, &mut failures);

        let independent = self.independent_steps(config);
        let count = independent.len();
        let results = join_all(independent)
            .instrument(info_span!("upsert_independent", count))
            .await;
        settle(results, &mut report, &mut failures);

        let dependent = self.dependent_steps(config);
        let count = dependent.len();
        let results = join_all(dependent)
            .instrument(info_span!("upsert_dependent", count))
            .await;
        settle(results, &mut report, &mut failures);

        if !failures.is_empty() {
            return Err(ApplyError::Failed {
                count: failures.len(),
                failures,
            });
        }

        log::info!(
            "Apply finished: {} deleted, {} already absent, {} created, {} updated, {} space(s) reconciled",
            report.deleted,
            report.absent,
            report.created,
            report.updated,
            report.reconciled
        );
        Ok(report)
    }

    fn outdated_steps<'a>(&'a self, outdated: &'a OutdatedConfig) -> Vec<Step<'a>> {
        let mut steps = Vec::new();
        for identifier in &outdated.metrics {
            steps.push(delete_outdated(self.client.metrics(), identifier).boxed());
        }
        for identifier in &outdated.spaces {
            steps.push(delete_outdated(self.client.spaces(), identifier).boxed());
        }
        for identifier in &outdated.alerts {
            steps.push(delete_outdated(self.client.alerts(), identifier).boxed());
        }
        for identifier in &outdated.services {
            steps.push(delete_outdated(self.client.services(), identifier).boxed());
        }
        for identifier in &outdated.sources {
            steps.push(delete_outdated(self.client.sources(), identifier).boxed());
        }
        steps
    }

    fn independent_steps<'a>(&'a self, config: &'a CanonicalConfig) -> Vec<Step<'a>> {
        let mut steps = Vec::new();
        for metric in &config.metrics {
            let definition = serde_json::to_value(metric).map_err(|e| e.to_string());
            steps.push(upsert_one(self.client.metrics(), &metric.name, definition).boxed());
        }
        for service in &config.services {
            steps.push(upsert_map(self.client.services(), service).boxed());
        }
        for source in &config.sources {
            steps.push(upsert_map(self.client.sources(), source).boxed());
        }
        steps
    }

    fn dependent_steps<'a>(&'a self, config: &'a CanonicalConfig) -> Vec<Step<'a>> {
        let mut steps = Vec::new();
        for space in &config.spaces {
            steps.push(self.reconcile_space(space).boxed());
        }
        for alert in &config.alerts {
            steps.push(upsert_map(self.client.alerts(), alert).boxed());
        }
        steps
    }

    async fn reconcile_space(&self, space: &SpaceDefinition) -> Result<Outcome, ResourceFailure> {
        match self.spaces.create_or_update(space).await {
            Ok(_) => Ok(Outcome::Reconciled),
            Err(e) => Err(ResourceFailure {
                kind: ResourceKind::Space,
                identifier: space.name.clone(),
                action: Action::Reconcile,
                message: e.to_string(),
            }),
        }
    }
}

async fn delete_outdated<P: Pagination>(
    api: ResourceApi<P>,
    identifier: &str,
) -> Result<Outcome, ResourceFailure> {
    match delete_by_identifier(&api, identifier).await {
        Ok(()) => {
            log::info!("Deleted outdated {} '{}'", api.kind(), identifier);
            Ok(Outcome::Deleted)
        }
        Err(e) if e.is_not_found() => {
            log::info!("Outdated {} '{}' is already absent", api.kind(), identifier);
            Ok(Outcome::Absent)
        }
        Err(e) => Err(ResourceFailure {
            kind: api.kind(),
            identifier: identifier.to_string(),
            action: Action::Delete,
            message: e.to_string(),
        }),
    }
}

async fn upsert_map<P: Pagination>(
    api: ResourceApi<P>,
    definition: &Map<String, Value>,
) -> Result<Outcome, ResourceFailure> {
    let identifier = definition
        .get(api.kind().identifier_field())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    upsert_one(api, &identifier, Ok(Value::Object(definition.clone()))).await
}

async fn upsert_one<P: Pagination>(
    api: ResourceApi<P>,
    identifier: &str,
    definition: Result<Value, String>,
) -> Result<Outcome, ResourceFailure> {
    let failed = |message: String| ResourceFailure {
        kind: api.kind(),
        identifier: identifier.to_string(),
        action: Action::Upsert,
        message,
    };

    let definition = definition.map_err(failed)?;
    match upsert(&api, &definition).await {
        Ok(outcome) => {
            log::info!("{} '{}' {}", api.kind(), identifier, outcome);
            Ok(Outcome::Upserted(outcome))
        }
        Err(e) => Err(failed(e.to_string())),
    }
}

fn settle(
    results: Vec<Result<Outcome, ResourceFailure>>,
    report: &mut ApplyReport,
    failures: &mut Vec<ResourceFailure>,
) {
    for result in results {
        match result {
            Ok(outcome) => report.record(outcome),
            Err(failure) => {
                log::error!(
                    "Failed to {} {} '{}': {}",
                    failure.action,
                    failure.kind,
                    failure.identifier,
                    failure.message
                );
                failures.push(failure);
            }
        }
    }
}
