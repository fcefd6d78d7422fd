use std::path::PathBuf;
use std::time::Duration;

use groupware_core::i18n::DEFAULT_LANGUAGE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" => Some(Self::Development),
            "production" => Some(Self::Production),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Per-client request budget: `max_requests` within each `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Version reported by /health and the OpenAPI document
    pub version: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    /// Fallback language for message resolution
    pub default_locale: String,
    /// Directory holding `<lng>/translation.json`; embedded tables when unset
    pub locales_dir: Option<PathBuf>,
    /// How long in-flight requests may drain after a shutdown signal
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = match var("APP_ENV").or_else(|| var("NODE_ENV")) {
            Some(value) => Environment::parse(&value).ok_or(ConfigError::Invalid {
                name: "APP_ENV",
                expected: "one of development, production, test",
                value,
            })?,
            None => Environment::Production,
        };

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or(ConfigError::Invalid {
                    name: "PORT",
                    expected: "a positive port number",
                    value,
                })?,
            None => 8080,
        };

        let max_requests = parse_positive(&var, "COMMON_RATE_LIMIT_MAX_REQUESTS", 100)?;
        let window_ms = parse_positive(&var, "COMMON_RATE_LIMIT_WINDOW_MS", 60_000)?;
        let shutdown_ms = parse_positive(&var, "SHUTDOWN_TIMEOUT_MS", 10_000)?;

        let cors_origins = var("CORS_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3001".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            environment,
            version: var("APP_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            host: var("HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            cors_origins,
            rate_limit: RateLimitConfig {
                max_requests: max_requests as u32,
                window: Duration::from_millis(window_ms),
            },
            default_locale: var("DEFAULT_LOCALE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            locales_dir: var("LOCALES_DIR").map(PathBuf::from),
            shutdown_timeout: Duration::from_millis(shutdown_ms),
        })
    }
}

/// Error worth reporting from loading a `.env` file. A missing file is not one.
pub fn dotenv_failure<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    result.err().filter(|err| !err.not_found())
}

fn parse_positive(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0 && *n <= u64::from(u32::MAX))
            .ok_or(ConfigError::Invalid {
                name,
                expected: "a positive integer",
                value,
            }),
        None => Ok(default),
    }
}
