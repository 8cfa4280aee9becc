//! Shared transport construction, CLI errors, and configuration loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow};
use hod_sso::{ConfigError, ReqwestTransport, SsoError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;

/// Everything a command handler needs.
pub(crate) struct AppContext {
    pub(crate) transport: ReqwestTransport,
    pub(crate) output: OutputFormat,
    pub(crate) config: Value,
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Flow or logout failure reported by the SSO machinery.
    pub(crate) fn sso(error: &SsoError) -> Self {
        let mut parts = vec![error.to_string()];
        if let Some(status) = error.status {
            parts.push(format!("status {status}"));
        }
        if let Some(reason) = &error.sso_error {
            parts.push(format!("SSO page reported: {reason}"));
        }
        if let Some(body) = &error.body {
            parts.push(format!("response: {body}"));
        }
        Self::Failure(anyhow!(parts.join(", ")))
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::MissingField { field } => Self::validation(format!("{field} is required")),
            ConfigError::InvalidField {
                field,
                value,
                reason,
            } => Self::validation(format!("{field} {reason} (got {value:?})")),
        }
    }
}

pub(crate) fn build_transport(timeout_secs: u64) -> CliResult<ReqwestTransport> {
    ReqwestTransport::new(Duration::from_secs(timeout_secs))
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Read a page configuration document; it must be a JSON object.
pub(crate) fn load_config_file(path: &Path) -> CliResult<Value> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;
    let config: Value = serde_json::from_str(&payload)
        .map_err(|err| CliError::validation(format!("config file is not valid JSON: {err}")))?;
    if config.is_object() {
        Ok(config)
    } else {
        Err(CliError::validation("config file must contain a JSON object"))
    }
}

/// Decode options from `config` after applying the flag values that were given.
pub(crate) fn options_from<T>(config: &Value, overrides: Vec<(&str, Option<Value>)>) -> CliResult<T>
where
    T: DeserializeOwned,
{
    let mut merged = config.as_object().cloned().unwrap_or_else(Map::new);
    for (key, value) in overrides {
        if let Some(value) = value {
            merged.insert(key.to_string(), value);
        }
    }
    serde_json::from_value(Value::Object(merged))
        .map_err(|err| CliError::validation(format!("invalid options: {err}")))
}
