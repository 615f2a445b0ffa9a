use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::matching::consent::DEFAULT_ADULT_AGE;
use crate::workflows::matching::service::DEFAULT_CAPACITY_RETRY_BUDGET;

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
    pub matching: MatchingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let adult_age = match env::var("MATCHFLOW_ADULT_AGE") {
            Ok(raw) => match raw.trim().parse::<u8>() {
                Ok(age) if age > 0 => age,
                _ => return Err(ConfigError::InvalidAdultAge { value: raw }),
            },
            Err(_) => DEFAULT_ADULT_AGE,
        };

        let capacity_retry_budget = match env::var("MATCHFLOW_CAPACITY_RETRIES") {
            Ok(raw) => match raw.trim().parse::<u8>() {
                Ok(budget) if budget > 0 => budget,
                _ => return Err(ConfigError::InvalidRetryBudget { value: raw }),
            },
            Err(_) => DEFAULT_CAPACITY_RETRY_BUDGET,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig {
                adult_age,
                capacity_retry_budget,
            },
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
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Minor-safety threshold and admission-control retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingConfig {
    pub adult_age: u8,
    pub capacity_retry_budget: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            adult_age: DEFAULT_ADULT_AGE,
            capacity_retry_budget: DEFAULT_CAPACITY_RETRY_BUDGET,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAdultAge { value: String },
    InvalidRetryBudget { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAdultAge { value } => {
                write!(f, "MATCHFLOW_ADULT_AGE must be an age between 1 and 255, got '{value}'")
            }
            ConfigError::InvalidRetryBudget { value } => write!(
                f,
                "MATCHFLOW_CAPACITY_RETRIES must be a positive attempt count, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidAdultAge { .. }
            | ConfigError::InvalidRetryBudget { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
