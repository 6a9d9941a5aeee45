//! Tracing setup shared by the HTTP server and the CLI.

use std::borrow::Cow;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Crates whose events follow `APP_LOG_LEVEL` when it is a bare level.
const SERVICE_TARGETS: [&str; 2] = ["scl90", "scl90_api"];
/// Level kept for dependencies (hyper, tower) when a bare level is configured.
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    InvalidFilter { value: String, source: ParseError },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expands a bare level such as `debug` so it only raises the service crates.
/// Full directive strings are used as written.
fn directives(log_level: &str) -> Cow<'_, str> {
    let level = log_level.trim();
    if level.contains(|c| c == '=' || c == ',') {
        return Cow::Borrowed(level);
    }

    let scoped = SERVICE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    Cow::Owned(format!("{DEPENDENCY_LEVEL},{scoped}"))
}

/// Filter derived from the configured level, ignoring `RUST_LOG`.
pub fn configured_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives(&config.log_level)).map_err(|source| {
        TelemetryError::InvalidFilter {
            value: config.log_level.clone(),
            source,
        }
    })
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: log_level.to_string(),
        }
    }

    #[test]
    fn bare_level_is_scoped_to_service_crates() {
        assert_eq!(
            directives(" debug "),
            "warn,scl90=debug,scl90_api=debug"
        );
        assert!(configured_filter(&config("debug")).is_ok());
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            directives("info,scl90::redemption=trace"),
            "info,scl90::redemption=trace"
        );
        assert_eq!(directives("tower=debug"), "tower=debug");
    }

    #[test]
    fn invalid_level_reports_configured_value() {
        let err = configured_filter(&config("verbose")).expect_err("unknown level rejected");
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
        assert!(err.to_string().contains("'verbose'"));
    }
}
