use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub workforce: WorkforceConfig,
    pub transaction: TransactionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    pub fn require_database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .context("APP_DATABASE__URL is required to start the server")
    }

    pub fn require_auth(&self) -> Result<&AuthConfig> {
        self.auth.as_ref().context(concat!(
            "APP_AUTH__JWT_SECRET, APP_AUTH__ADMIN_EMAIL and APP_AUTH__ADMIN_API_KEY ",
            "are required to start the server",
        ))
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_api_key: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
}

/// Workplace policy applied by the clock and reporting services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkforceConfig {
    pub default_daily_hours_limit: f64,
    pub default_weekly_hours_limit: f64,
    pub max_shift_hours: f64,
    pub min_pin_length: usize,
    pub enforce_daily_limit: bool,
}

impl Default for WorkforceConfig {
    fn default() -> Self {
        Self {
            default_daily_hours_limit: defaults::DEFAULT_DAILY_HOURS_LIMIT,
            default_weekly_hours_limit: defaults::DEFAULT_WEEKLY_HOURS_LIMIT,
            max_shift_hours: defaults::DEFAULT_MAX_SHIFT_HOURS,
            min_pin_length: defaults::DEFAULT_MIN_PIN_LENGTH as usize,
            enforce_daily_limit: defaults::DEFAULT_ENFORCE_DAILY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransactionConfig {
    pub max_wait_ms: u64,
    pub timeout_ms: u64,
}

impl TransactionConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: defaults::DEFAULT_TRANSACTION_MAX_WAIT_MS as u64,
            timeout_ms: defaults::DEFAULT_TRANSACTION_TIMEOUT_MS as u64,
        }
    }
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_access_ttl_secs() -> u64 {
    defaults::DEFAULT_ACCESS_TTL_SECS as u64
}

fn default_session_ttl_hours() -> u64 {
    defaults::DEFAULT_SESSION_TTL_HOURS as u64
}
