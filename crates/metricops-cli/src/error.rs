use metricops::MetricOpsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    MetricOps(#[from] MetricOpsError),

    #[error("No account email provided (use --email or METRICOPS_EMAIL)")]
    MissingEmail,

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl CliError {
    /// Individual failures behind an aggregate error, one line each.
    pub fn details(&self) -> Vec<String> {
        match self {
            CliError::MetricOps(MetricOpsError::Apply(e)) => {
                e.failures().iter().map(ToString::to_string).collect()
            }
            CliError::MetricOps(MetricOpsError::Reconcile(e)) => {
                e.chart_failures().iter().map(ToString::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}
