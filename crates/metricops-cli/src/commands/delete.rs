use metricops::api::{Pagination, ResourceApi};
use metricops::{delete_by_identifier, Client, ReconcileError, SpaceReconciler};

use super::{KindArg, Output};

/// Deletes one resource by name (title for services).
pub async fn run(
    client: &Client,
    kind: KindArg,
    identifier: &str,
    space: Option<&str>,
) -> metricops::Result<Output> {
    match kind {
        KindArg::Metrics => delete(client.metrics(), identifier).await?,
        KindArg::Spaces => delete(client.spaces(), identifier).await?,
        KindArg::Alerts => delete(client.alerts(), identifier).await?,
        KindArg::Services => delete(client.services(), identifier).await?,
        KindArg::Sources => delete(client.sources(), identifier).await?,
        KindArg::Charts => {
            let space_name = space.unwrap_or_default();
            let remote = SpaceReconciler::new(client)
                .find_space(space_name)
                .await?
                .ok_or_else(|| ReconcileError::SpaceNotFound {
                    name: space_name.to_string(),
                })?;
            delete(client.charts(remote.id), identifier).await?
        }
    }

    Ok(Output::Text(format!(
        "Deleted {} '{}'",
        metricops::ResourceKind::from(kind),
        identifier
    )))
}

async fn delete<P: Pagination>(
    api: ResourceApi<P>,
    identifier: &str,
) -> Result<(), metricops::ApiError> {
    log::info!("Deleting {} '{}'", api.kind(), identifier);
    delete_by_identifier(&api, identifier).await
}
