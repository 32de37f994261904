use std::env;
use std::fmt;

use chrono_tz::Tz;

use crate::quote::{PricingConfig, ProrationStrategy};

/// Distinguishes runtime behavior for different stages of the engine's hosts.
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

/// Top-level configuration read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timezone = match env::var("QUOTE_TIMEZONE") {
            Ok(value) => value
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone { value })?,
            Err(_) => chrono_tz::UTC,
        };
        let proration = match env::var("QUOTE_PRORATION_STRATEGY") {
            Ok(value) => ProrationStrategy::parse(&value)
                .ok_or(ConfigError::InvalidProrationStrategy { value })?,
            Err(_) => ProrationStrategy::default(),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            pricing: PricingConfig {
                timezone,
                proration,
            },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, only for interactive development runs.
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTimezone { value: String },
    InvalidProrationStrategy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTimezone { value } => {
                write!(f, "QUOTE_TIMEZONE must name an IANA timezone, got '{value}'")
            }
            ConfigError::InvalidProrationStrategy { value } => write!(
                f,
                "QUOTE_PRORATION_STRATEGY must be '30 day month' or 'Calendar month', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
