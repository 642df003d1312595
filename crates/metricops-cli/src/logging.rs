use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::CliError;

/// Default filter for a verbosity count; `RUST_LOG` overrides it.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr subscriber and routes `log` records into it.
pub fn init(verbosity: u8) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity >= 2),
    );

    tracing_log::LogTracer::init().map_err(|e| CliError::Logging(e.to_string()))?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::Logging(e.to_string()))
}
