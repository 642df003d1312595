use metricops::api::{Pagination, Query, ResourceApi};
use metricops::{Client, ReconcileError, SpaceReconciler};
use serde_json::Value;

use super::{KindArg, Output};

/// Lists every resource of a kind, following all pages.
pub async fn run(
    client: &Client,
    kind: KindArg,
    name: Option<&str>,
    space: Option<&str>,
) -> metricops::Result<Output> {
    let mut query = Query::new();
    if let Some(name) = name {
        query.set("name", name);
    }

    let items = match kind {
        KindArg::Metrics => list(client.metrics(), &query).await?,
        KindArg::Spaces => list(client.spaces(), &query).await?,
        KindArg::Alerts => list(client.alerts(), &query).await?,
        KindArg::Services => list(client.services(), &query).await?,
        KindArg::Sources => list(client.sources(), &query).await?,
        KindArg::Charts => {
            let space_name = space.unwrap_or_default();
            let remote = SpaceReconciler::new(client)
                .find_space(space_name)
                .await?
                .ok_or_else(|| ReconcileError::SpaceNotFound {
                    name: space_name.to_string(),
                })?;
            list(client.charts(remote.id), &query).await?
        }
    };

    Ok(Output::json(Value::Array(items)))
}

async fn list<P: Pagination>(
    api: ResourceApi<P>,
    query: &Query,
) -> Result<Vec<Value>, metricops::ApiError> {
    api.list_all(query).await
}
