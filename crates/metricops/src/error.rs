use thiserror::Error;

pub use crate::api::ApiError;
pub use crate::apply::ApplyError;
pub use crate::composite::CompositeError;
pub use crate::config::ConfigError;
pub use crate::reconcile::ReconcileError;
pub use crate::secrets::SecretError;
pub use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum MetricOpsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Space error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Apply failed: {0}")]
    Apply(#[from] ApplyError),

    #[error("Credentials error: {0}")]
    Secret(#[from] SecretError),

    #[error("Composite error: {0}")]
    Composite(#[from] CompositeError),
}

impl MetricOpsError {
    /// Returns true for errors raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            MetricOpsError::Config(_)
                | MetricOpsError::Template(_)
                | MetricOpsError::Secret(_)
                | MetricOpsError::Composite(_)
                | MetricOpsError::Reconcile(ReconcileError::Config(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, MetricOpsError>;
