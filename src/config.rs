//! Configuration module for the resource planner
//!
//! This module handles configuration loading from TOML files and `.env`
//! overrides, and provides the typed sub-configs handed to each component at
//! construction. Components never read the process environment themselves.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// TronGrid full-node HTTP API
    #[serde(default)]
    pub tron: TronConfig,

    /// Tronscan explorer API (history and risk flags)
    #[serde(default)]
    pub tronscan: TronscanConfig,

    /// Fee schedule constants
    #[serde(default)]
    pub fees: FeeConfig,

    /// Energy rental market and polling
    #[serde(default)]
    pub rental: RentalConfig,

    /// Transfer planning policy
    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronConfig {
    #[serde(default = "default_tron_endpoint")]
    pub endpoint: String,

    /// Sent as `TRON-PRO-API-KEY`; overridden by `TRONGRID_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronscanConfig {
    #[serde(default = "default_tronscan_endpoint")]
    pub endpoint: String,

    /// Overridden by `TRONSCAN_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Sun burned per missing energy unit
    #[serde(default = "default_energy_unit_price")]
    pub energy_unit_price: u64,

    /// Sun burned per missing bandwidth byte
    #[serde(default = "default_bandwidth_unit_price")]
    pub bandwidth_unit_price: u64,

    /// Extra bytes added to the measured transaction size
    #[serde(default = "default_bandwidth_slack")]
    pub bandwidth_slack: u64,

    /// Safety multiplier applied to estimated fees
    #[serde(default = "default_fee_limit_factor")]
    pub fee_limit_factor: f64,

    /// Bandwidth fee used when bandwidth data is unavailable (sun)
    #[serde(default = "default_bandwidth_fee")]
    pub default_bandwidth_fee: u64,

    /// Energy assumed when the dry run reverts for a brand-new recipient
    #[serde(default = "default_new_account_energy")]
    pub new_account_energy: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalConfig {
    #[serde(default = "default_rental_endpoint")]
    pub endpoint: String,

    /// Overridden by `ITRX_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Rental period requested from the market
    #[serde(default = "default_rental_period")]
    pub period: String,

    /// Seconds between energy checks while waiting for a rental
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up waiting for rented energy after this many seconds
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Require `balance > amount` instead of `balance >= amount`
    #[serde(default = "default_true")]
    pub require_strictly_greater: bool,

    /// Maximum number of past transfers reported
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_tron_endpoint() -> String { "https://api.trongrid.io".to_string() }
fn default_tronscan_endpoint() -> String { "https://apilist.tronscanapi.com".to_string() }
fn default_rental_endpoint() -> String { "https://itrx.io".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_energy_unit_price() -> u64 { 420 }
fn default_bandwidth_unit_price() -> u64 { 1_000 }
fn default_bandwidth_slack() -> u64 { 3 }
fn default_fee_limit_factor() -> f64 { 1.1 }
fn default_bandwidth_fee() -> u64 { 3_000_000 }
fn default_new_account_energy() -> u64 { 31_895 }
fn default_rental_period() -> String { "1H".to_string() }
fn default_poll_interval() -> u64 { 5 }
fn default_max_wait() -> u64 { 600 }
fn default_history_limit() -> usize { 3 }
fn default_true() -> bool { true }

impl Default for TronConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tron_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TronscanConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tronscan_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            energy_unit_price: default_energy_unit_price(),
            bandwidth_unit_price: default_bandwidth_unit_price(),
            bandwidth_slack: default_bandwidth_slack(),
            fee_limit_factor: default_fee_limit_factor(),
            default_bandwidth_fee: default_bandwidth_fee(),
            new_account_energy: default_new_account_energy(),
        }
    }
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rental_endpoint(),
            api_key: None,
            period: default_rental_period(),
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            require_strictly_greater: default_true(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with `.env` and environment variable overrides
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply API-key overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("TRONGRID_KEY") {
            self.tron.api_key = Some(key);
        }
        if let Some(key) = non_empty("TRONSCAN_KEY") {
            self.tronscan.api_key = Some(key);
        }
        if let Some(key) = non_empty("ITRX_API_KEY") {
            self.rental.api_key = Some(key);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("tron.endpoint", &self.tron.endpoint),
            ("tronscan.endpoint", &self.tronscan.endpoint),
            ("rental.endpoint", &self.rental.endpoint),
        ] {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{name} must not be empty")));
            }
        }

        if !self.fees.fee_limit_factor.is_finite() || self.fees.fee_limit_factor < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "fees.fee_limit_factor must be >= 1.0, got {}",
                self.fees.fee_limit_factor
            )));
        }

        for (name, timeout) in [
            ("tron.timeout_secs", self.tron.timeout_secs),
            ("tronscan.timeout_secs", self.tronscan.timeout_secs),
            ("rental.timeout_secs", self.rental.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
            }
        }

        if self.rental.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rental.poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.rental.max_wait_secs < self.rental.poll_interval_secs {
            return Err(ConfigError::ValidationError(format!(
                "rental.max_wait_secs ({}) must be >= rental.poll_interval_secs ({})",
                self.rental.max_wait_secs, self.rental.poll_interval_secs
            )));
        }

        if self.planner.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "planner.history_limit must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
