//! API token resolution.
//!
//! The token can be given in three ways, checked in this order:
//!
//! 1. **Direct value**, handy for a one-off run (`--token`)
//! 2. **File**, for mounted secrets (`--token-file /run/secrets/metrics-token`)
//! 3. **Environment variable**, named by `--token-env` (default `METRICOPS_TOKEN`)

use secrecy::SecretString;
use std::fs;
use std::path::PathBuf;

/// Environment variable read for the token when nothing else is given.
pub const DEFAULT_TOKEN_ENV_VAR: &str = "METRICOPS_TOKEN";

/// Errors that can occur while resolving the API token.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API token provided (need one of: direct value, token file, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read API token from '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Result type for token resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves the API token from the first source that is set.
///
/// Empty strings count as unset. File contents and environment values are
/// trimmed, so a trailing newline never ends up in the `Authorization`
/// header. A leading `~/` in the file path is expanded to the home
/// directory.
pub fn resolve_token(
    direct: Option<&str>,
    file: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file.filter(|p| !p.is_empty()) {
        let path = expand_home(path);
        log::debug!("Reading API token from {}", path.display());
        return fs::read_to_string(&path)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|source| SecretError::FileRead { path, source });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

fn expand_home(path: &str) -> PathBuf {
    let rest = match path {
        "~" => Some(""),
        _ => path.strip_prefix("~/"),
    };

    match (rest, std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
