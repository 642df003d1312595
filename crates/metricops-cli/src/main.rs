//! `metricops` command line tool.

mod commands;
mod error;
mod logging;

use clap::{ArgAction, Args, Parser, Subcommand};
use metricops::api::{ClientConfig, DEFAULT_API_URL, DEFAULT_MAX_RETRIES};
use metricops::secrets::{resolve_token, DEFAULT_TOKEN_ENV_VAR};
use metricops::{Client, MetricOpsError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use commands::{KindArg, Output, OutputFormat};
use error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "metricops",
    version,
    about = "Manage metrics, spaces, alerts, services and sources from declarative config"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Account email used for basic authentication
    #[arg(long, env = "METRICOPS_EMAIL", global = true)]
    email: Option<String>,

    /// API token (prefer --token-file or --token-env)
    #[arg(long, global = true)]
    token: Option<String>,

    /// File containing the API token
    #[arg(long, global = true)]
    token_file: Option<String>,

    /// Environment variable holding the API token
    #[arg(long, global = true, default_value = DEFAULT_TOKEN_ENV_VAR)]
    token_env: String,

    /// Base URL of the management API
    #[arg(long, env = "METRICOPS_API_URL", global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Retries for transient failures (never applied to creates)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a config directory as JSON
    Normalize { dir: PathBuf },

    /// Apply a config directory to the account
    Apply { dir: PathBuf },

    /// Dump or apply a single space
    #[command(subcommand)]
    Space(SpaceCommand),

    /// List every resource of a kind as JSON
    List {
        #[arg(value_enum)]
        kind: KindArg,

        /// Only list resources whose name matches (server-side filter)
        #[arg(long)]
        name: Option<String>,

        /// Space whose charts to list
        #[arg(long, required_if_eq("kind", "charts"))]
        space: Option<String>,
    },

    /// Delete a resource by name (title for services)
    Delete {
        #[arg(value_enum)]
        kind: KindArg,

        identifier: String,

        /// Space the chart belongs to
        #[arg(long, required_if_eq("kind", "charts"))]
        space: Option<String>,
    },

    /// Print a composite expression for a metric
    Composite {
        metric: String,

        #[arg(long, default_value = "*")]
        source: String,

        /// Wrap the series in a function (sum, mean, max, min, derive)
        #[arg(long)]
        function: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SpaceCommand {
    /// Print a space and its charts without server-assigned ids
    Dump {
        name: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Create or update a space from a JSON or YAML file
    Apply { file: PathBuf },
}

impl ConnectionArgs {
    fn connect(&self) -> Result<Client, CliError> {
        let email = self
            .email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or(CliError::MissingEmail)?;
        let token = resolve_token(
            self.token.as_deref(),
            self.token_file.as_deref(),
            Some(&self.token_env),
        )
        .map_err(MetricOpsError::from)?;

        let config = ClientConfig::new(email, token)
            .with_base_url(&self.api_url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.retries);
        Ok(Client::from_config(config).map_err(MetricOpsError::from)?)
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let output = match cli.command {
        Command::Normalize { dir } => commands::normalize::run(&dir)?,
        Command::Composite {
            metric,
            source,
            function,
        } => commands::composite::run(&metric, &source, function.as_deref())?,
        Command::Apply { dir } => {
            let client = cli.connection.connect()?;
            commands::apply::run(&client, &dir).await?
        }
        Command::Space(SpaceCommand::Dump { name, format }) => {
            let client = cli.connection.connect()?;
            commands::space::dump(&client, &name, format).await?
        }
        Command::Space(SpaceCommand::Apply { file }) => {
            let client = cli.connection.connect()?;
            commands::space::apply(&client, &file).await?
        }
        Command::List { kind, name, space } => {
            let client = cli.connection.connect()?;
            commands::list::run(&client, kind, name.as_deref(), space.as_deref()).await?
        }
        Command::Delete {
            kind,
            identifier,
            space,
        } => {
            let client = cli.connection.connect()?;
            commands::delete::run(&client, kind, &identifier, space.as_deref()).await?
        }
    };

    output.print()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("metricops: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("metricops: {}", e);
            for detail in e.details() {
                eprintln!("  - {}", detail);
            }
            ExitCode::FAILURE
        }
    }
}
