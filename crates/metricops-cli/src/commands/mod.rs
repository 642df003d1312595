pub mod apply;
pub mod composite;
pub mod delete;
pub mod list;
pub mod normalize;
pub mod space;

use clap::ValueEnum;
use metricops::ResourceKind;
use serde_json::Value;

use crate::error::CliError;

/// Resource kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Metrics,
    Spaces,
    Charts,
    Alerts,
    Services,
    Sources,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Metrics => ResourceKind::Metric,
            KindArg::Spaces => ResourceKind::Space,
            KindArg::Charts => ResourceKind::Chart,
            KindArg::Alerts => ResourceKind::Alert,
            KindArg::Services => ResourceKind::Service,
            KindArg::Sources => ResourceKind::Source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// What a command prints on stdout.
#[derive(Debug)]
pub enum Output {
    Document(Value, OutputFormat),
    Text(String),
}

impl Output {
    pub fn json(value: Value) -> Self {
        Output::Document(value, OutputFormat::Json)
    }

    fn render(&self) -> Result<String, CliError> {
        match self {
            Output::Document(value, OutputFormat::Json) => serde_json::to_string_pretty(value)
                .map_err(|e| CliError::Output(e.to_string())),
            Output::Document(value, OutputFormat::Yaml) => {
                serde_yaml::to_string(value).map_err(|e| CliError::Output(e.to_string()))
            }
            Output::Text(text) => Ok(text.clone()),
        }
    }

    pub fn print(&self) -> Result<(), CliError> {
        let rendered = self.render()?;
        println!("{}", rendered.trim_end());
        Ok(())
    }
}
