use std::env;
use std::net::{IpAddr, SocketAddr};

/// Prefix stamped on generated redemption codes when none is configured.
pub const DEFAULT_CODE_PREFIX: &str = "SCL90";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub redemption: RedemptionConfig,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Reads `APP_*` variables, after loading `.env` when one is present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_port = var_or("APP_PORT", "3000");
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { value: raw_port })?;

        Ok(Self {
            environment: AppEnvironment::from_str(&var_or("APP_ENV", "development")),
            server: ServerConfig {
                host: var_or("APP_HOST", "127.0.0.1"),
                port,
            },
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
            redemption: RedemptionConfig::with_prefix(&var_or(
                "APP_CODE_PREFIX",
                DEFAULT_CODE_PREFIX,
            ))?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    value: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filter handed to [`crate::telemetry::init`].
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for redemption code issuance.
#[derive(Debug, Clone)]
pub struct RedemptionConfig {
    pub code_prefix: String,
}

impl RedemptionConfig {
    /// Normalizes `prefix` to uppercase and requires non-empty ASCII alphanumerics.
    pub fn with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let code_prefix = prefix.trim().to_ascii_uppercase();
        if code_prefix.is_empty() || !code_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidCodePrefix { value: code_prefix });
        }
        Ok(Self { code_prefix })
    }
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16 (got '{value}')")]
    InvalidPort { value: String },
    #[error("APP_HOST must parse to an IPv4 or IPv6 address (got '{value}')")]
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("APP_CODE_PREFIX must be non-empty ASCII alphanumerics (got '{value}')")]
    InvalidCodePrefix { value: String },
}
