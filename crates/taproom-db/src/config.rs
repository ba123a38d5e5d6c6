//! # Store Configuration
//!
//! Settings for opening the store, building sales and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAPROOM_DB_PATH=/var/lib/taproom/taproom.db                        │
//! │     TAPROOM_MAX_CONNECTIONS=4                                          │
//! │     TAPROOM_LOG=info,taproom_db=debug                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/taproom.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.taproom.pos/taproom.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     taproom.db in the platform data dir, 16% VAT                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # taproom.toml
//! [database]
//! path = "/var/lib/taproom/taproom.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [sales]
//! vat_rate_bps = 1600
//! split_tolerance_minor = 100
//!
//! [logging]
//! filter = "info,taproom=debug,sqlx=warn"
//! ```
//!
//! ## VAT Precedence
//! The stored `AppSettings.vat_rate_bps` is what the till edits and always
//! wins. `[sales].vat_rate_bps` only applies while no settings document
//! exists, and is what the `seed` binary writes into a fresh store.
//!
//! ## Logging Order
//! `load` runs before any subscriber exists, so its own `debug!`/`info!`
//! lines are dropped unless the caller installed one first. Callers log
//! the loaded result themselves once [`init_tracing`](crate::init_tracing)
//! has run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::pool::DbConfig;
use taproom_core::validation::validate_tax_rate_bps;
use taproom_core::{AppSettings, Money, PaymentMethod, SaleContext, TaxRate};

/// Default tracing filter when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,taproom=debug,sqlx=warn";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `taproom.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSettings {
    /// VAT in basis points (1600 = 16%).
    #[serde(default = "default_vat_rate")]
    pub vat_rate_bps: u32,

    /// Largest accepted gap between a split breakdown and the total.
    #[serde(default = "default_split_tolerance")]
    pub split_tolerance_minor: i64,
}

fn default_vat_rate() -> u32 {
    1600
}
fn default_split_tolerance() -> i64 {
    100
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            vat_rate_bps: default_vat_rate(),
            split_tolerance_minor: default_split_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive. `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// App Config
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SalesSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (taproom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        validate_tax_rate_bps(self.sales.vat_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.sales.split_tolerance_minor < 0 {
            return Err(ConfigError::Invalid(
                "split_tolerance_minor must not be negative".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TAPROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(max) = std::env::var("TAPROOM_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse::<u32>() {
                self.database.max_connections = n;
            }
        }

        if let Ok(filter) = std::env::var("TAPROOM_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "taproom", "pos")
            .map(|dirs| dirs.config_dir().join("taproom.toml"))
    }

    fn default_database_path() -> PathBuf {
        directories::ProjectDirs::from("com", "taproom", "pos")
            .map(|dirs| dirs.data_dir().join("taproom.db"))
            .unwrap_or_else(|| PathBuf::from("taproom.db"))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Resolved database file path.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }

    /// VAT for new sales: stored settings first, then `[sales]`.
    pub fn vat_rate(&self, settings: Option<&AppSettings>) -> TaxRate {
        settings
            .map(AppSettings::vat_rate)
            .unwrap_or_else(|| TaxRate::from_bps(self.sales.vat_rate_bps))
    }

    /// A paid-at-the-till sale context using [`AppConfig::vat_rate`] and the
    /// configured split tolerance.
    pub fn sale_context(
        &self,
        settings: Option<&AppSettings>,
        payment_method: PaymentMethod,
        cashier_id: &str,
        timestamp: DateTime<Utc>,
    ) -> SaleContext {
        SaleContext::new(
            payment_method,
            cashier_id,
            self.vat_rate(settings),
            timestamp,
        )
        .with_split_tolerance(Money::from_minor(self.sales.split_tolerance_minor))
    }

    /// Tracing filter: config value or [`DEFAULT_LOG_FILTER`].
    pub fn log_filter(&self) -> &str {
        self.logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
