//! Entry point handing out one capability per resource kind.

use std::sync::Arc;

use super::error::Result;
use super::http::{ClientConfig, HttpTransport};
use super::pagination::{Keyset, Offset, Unpaged};
use super::resource::ResourceApi;
use super::transport::Transport;
use crate::model::ResourceKind;

/// Management API client.
///
/// Cheap to clone; every capability shares the same transport.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Builds a client talking HTTPS to the configured endpoint.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        log::debug!("Creating API client for {}", config.base_url);
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    fn offset(&self, kind: ResourceKind) -> ResourceApi<Offset> {
        ResourceApi::new(Arc::clone(&self.transport), kind, kind.collection())
    }

    pub fn metrics(&self) -> ResourceApi<Offset> {
        self.offset(ResourceKind::Metric)
    }

    pub fn spaces(&self) -> ResourceApi<Offset> {
        self.offset(ResourceKind::Space)
    }

    pub fn services(&self) -> ResourceApi<Offset> {
        self.offset(ResourceKind::Service)
    }

    pub fn sources(&self) -> ResourceApi<Offset> {
        self.offset(ResourceKind::Source)
    }

    pub fn alerts(&self) -> ResourceApi<Keyset> {
        ResourceApi::new(
            Arc::clone(&self.transport),
            ResourceKind::Alert,
            ResourceKind::Alert.collection(),
        )
    }

    /// Charts of one space. The API returns them as a bare array.
    pub fn charts(&self, space_id: u64) -> ResourceApi<Unpaged> {
        ResourceApi::new(
            Arc::clone(&self.transport),
            ResourceKind::Chart,
            format!("spaces/{}/charts", space_id),
        )
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
