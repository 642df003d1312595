//! Dumping a space and reconciling one against a local definition.

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::error::{ChartFailure, ChartOp, ReconcileError, Result};
use super::plan::{plan_charts, validate_space};
use crate::api::{ApiError, Client, Query, ResourceApi, Unpaged};
use crate::model::{ChartDefinition, RemoteChart, RemoteSpace, SpaceDefinition};

/// What a successful [`SpaceReconciler::create_or_update`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpaceReport {
    pub space_id: u64,
    /// Whether the space itself had to be created.
    pub created: bool,
    pub charts_deleted: usize,
    pub charts_updated: usize,
    pub charts_created: usize,
}

/// Reads and writes spaces together with their charts.
///
/// Charts are matched by name, so a dumped space can be applied to another
/// account where chart ids differ.
#[derive(Debug, Clone)]
pub struct SpaceReconciler {
    client: Client,
}

impl SpaceReconciler {
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Looks up a space by exact name. Returns `None` if there is none.
    pub async fn find_space(&self, name: &str) -> Result<Option<RemoteSpace>> {
        match self.client.spaces().find_by_identifier(name).await {
            Ok(found) => Ok(Some(decode(found)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the charts of a space as the API stores them.
    pub async fn load_charts(&self, space_id: u64) -> Result<Vec<RemoteChart>> {
        let items = self
            .client
            .charts(space_id)
            .list_all(&Query::new())
            .await?;
        let charts = items
            .into_iter()
            .map(decode)
            .collect::<std::result::Result<Vec<RemoteChart>, ApiError>>()?;
        Ok(charts)
    }

    /// Exports a space in the shape [`create_or_update`](Self::create_or_update)
    /// accepts, without any server-assigned ids.
    pub async fn dump(&self, name: &str) -> Result<SpaceDefinition> {
        let space = self
            .find_space(name)
            .await?
            .ok_or_else(|| ReconcileError::SpaceNotFound {
                name: name.to_string(),
            })?;

        let charts = self
            .load_charts(space.id)
            .await?
            .into_iter()
            .map(|chart| chart.definition.into_portable())
            .collect();

        log::info!("Dumped space '{}' (id {})", space.name, space.id);
        Ok(SpaceDefinition {
            name: space.name,
            charts,
        })
    }

    /// Makes the remote space match `space`.
    ///
    /// Chart names are validated before any request is sent. The space is
    /// created if missing; an existing space keeps its own fields. Chart
    /// deletes run first, then updates, then creates. Each batch runs
    /// concurrently and a failing chart does not stop its siblings.
    pub async fn create_or_update(&self, space: &SpaceDefinition) -> Result<SpaceReport> {
        validate_space(space)?;

        let (remote, created) = match self.find_space(&space.name).await? {
            Some(remote) => (remote, false),
            None => {
                let body = json!({ "name": space.name });
                let remote: RemoteSpace = decode(self.client.spaces().create(&body).await?)?;
                log::info!("Created space '{}' (id {})", remote.name, remote.id);
                (remote, true)
            }
        };

        let existing = if created {
            Vec::new()
        } else {
            self.load_charts(remote.id).await?
        };

        let plan = plan_charts(&existing, &space.charts);
        log::debug!(
            "Space '{}': {} to delete, {} to update, {} to create",
            space.name,
            plan.delete.len(),
            plan.update.len(),
            plan.create.len()
        );

        let charts = self.client.charts(remote.id);
        let mut failures = Vec::new();

        let deletes = join_all(plan.delete.iter().map(|chart| delete_chart(&charts, chart))).await;
        let charts_deleted = settle(deletes, &mut failures);

        let updates = join_all(
            plan.update
                .iter()
                .map(|(current, desired)| update_chart(&charts, current, desired)),
        )
        .await;
        let charts_updated = settle(updates, &mut failures);

        let creates = join_all(plan.create.iter().map(|desired| create_chart(&charts, desired))).await;
        let charts_created = settle(creates, &mut failures);

        if !failures.is_empty() {
            for f in &failures {
                log::error!("Space '{}': {}", space.name, f);
            }
            return Err(ReconcileError::ChartFailures {
                space: space.name.clone(),
                failures,
            });
        }

        log::info!(
            "Space '{}' reconciled: {} deleted, {} updated, {} created",
            space.name,
            charts_deleted,
            charts_updated,
            charts_created
        );

        Ok(SpaceReport {
            space_id: remote.id,
            created,
            charts_deleted,
            charts_updated,
            charts_created,
        })
    }
}

async fn delete_chart(
    charts: &ResourceApi<Unpaged>,
    chart: &RemoteChart,
) -> std::result::Result<(), ChartFailure> {
    charts
        .delete(&chart.id.to_string())
        .await
        .map_err(|source| failure(chart.name(), ChartOp::Delete, source))
}

async fn update_chart(
    charts: &ResourceApi<Unpaged>,
    current: &RemoteChart,
    desired: &ChartDefinition,
) -> std::result::Result<Value, ChartFailure> {
    let result = match encode(desired) {
        Ok(body) => charts.update(&current.id.to_string(), &body).await,
        Err(e) => Err(e),
    };
    result.map_err(|source| failure(&desired.name, ChartOp::Update, source))
}

async fn create_chart(
    charts: &ResourceApi<Unpaged>,
    desired: &ChartDefinition,
) -> std::result::Result<Value, ChartFailure> {
    let result = match encode(desired) {
        Ok(body) => charts.create(&body).await,
        Err(e) => Err(e),
    };
    result.map_err(|source| failure(&desired.name, ChartOp::Create, source))
}

fn failure(chart: &str, op: ChartOp, source: ApiError) -> ChartFailure {
    ChartFailure {
        chart: chart.to_string(),
        op,
        source,
    }
}

/// Moves the failures of a settled batch into `failures` and counts the
/// successes.
fn settle<T>(
    results: Vec<std::result::Result<T, ChartFailure>>,
    failures: &mut Vec<ChartFailure>,
) -> usize {
    let mut succeeded = 0;
    for result in results {
        match result {
            Ok(_) => succeeded += 1,
            Err(f) => failures.push(f),
        }
    }
    succeeded
}

fn decode<T: DeserializeOwned>(value: Value) -> std::result::Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode(chart: &ChartDefinition) -> std::result::Result<Value, ApiError> {
    serde_json::to_value(chart).map_err(|e| ApiError::Decode(e.to_string()))
}
