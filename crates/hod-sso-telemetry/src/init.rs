//! Subscriber installation and logging configuration.
//!
//! # Design
//! - One entry point installs either the JSON or the human-readable formatter.
//! - `RUST_LOG` wins over the configured level when it is set.
//! - The build SHA is recorded once so every span reports the same value.

use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] if another subscriber has
/// already been set globally.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // First caller wins.
    let _ = BUILD_SHA.set(config.build_sha.to_string());

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in command spans.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(TelemetryError::UnknownLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Derive the log format from a JSON configuration document.
///
/// Reads `logFormat`; unknown names fall back to [`LogFormat::infer`].
#[must_use]
pub fn log_format_from_config(config: Option<&serde_json::Value>) -> Option<LogFormat> {
    config
        .and_then(|value| value.get("logFormat"))
        .and_then(serde_json::Value::as_str)
        .map(|value| value.parse().unwrap_or_else(|_| LogFormat::infer()))
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_format_from_config_parses_variants() {
        let json_config = json!({"logFormat": "json"});
        assert_eq!(log_format_from_config(Some(&json_config)), Some(LogFormat::Json));

        let pretty_config = json!({"logFormat": "Pretty"});
        assert_eq!(
            log_format_from_config(Some(&pretty_config)),
            Some(LogFormat::Pretty)
        );

        let inferred = log_format_from_config(Some(&json!({"logFormat": "unknown"})));
        assert_eq!(inferred, Some(LogFormat::infer()));

        assert!(log_format_from_config(Some(&json!({}))).is_none());
        assert!(log_format_from_config(None).is_none());
    }

    #[test]
    fn log_format_rejects_unknown_names() {
        assert_eq!("json".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownLogFormat { value }) if value == "xml"
        ));
    }

    #[test]
    fn init_logging_installs_subscriber_once() {
        let config = LoggingConfig {
            level: "info",
            format: LogFormat::Pretty,
            build_sha: "abc123",
        };
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
        assert_eq!(build_sha(), "abc123");
    }
}
