//! Application settings loading from `config.toml`.
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults below. Consumable models listed under `[[consumables]]` are seeded
//! into the database on startup when they do not exist yet.

use crate::errors::{Error, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stock ledger policy
    pub ledger: LedgerPolicy,
    /// Windows used by the derived-status computations
    pub status: StatusWindows,
    /// Consumable models to seed
    pub consumables: Vec<ConsumableConfig>,
}

/// Policy knobs for the consumables ledger
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    /// Allow `issue` to take stock below zero (backorder). Off by default.
    pub allow_negative_stock: bool,
    /// Overwrite drifted stock caches with the replayed ledger value on startup
    pub repair_on_startup: bool,
}

/// Look-ahead windows for "due soon" and "expiring soon" labels
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusWindows {
    /// A PM schedule due within this many days is "due soon"
    pub due_soon_days: i64,
    /// A license or contract ending within this many days is "expiring soon"
    pub expiry_warning_days: i64,
}

impl Default for StatusWindows {
    fn default() -> Self {
        Self {
            due_soon_days: 7,
            expiry_warning_days: 30,
        }
    }
}

impl StatusWindows {
    /// PM look-ahead as a duration
    #[must_use]
    pub fn due_soon_window(&self) -> Duration {
        Duration::days(self.due_soon_days)
    }

    /// License/contract look-ahead as a duration
    #[must_use]
    pub fn expiry_window(&self) -> Duration {
        Duration::days(self.expiry_warning_days)
    }
}

/// Configuration for a single consumable model
#[derive(Debug, Deserialize, Clone)]
pub struct ConsumableConfig {
    /// Manufacturer model number, used as the seeding key
    pub model_number: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_consumable_type")]
    pub consumable_type: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub min_stock_level: i64,
}

fn default_consumable_type() -> String {
    "toner".to_string()
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A window is negative
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text and validates them
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.status.due_soon_days < 0 || config.status.expiry_warning_days < 0 {
        return Err(Error::Config {
            message: "Status windows must not be negative".to_string(),
        });
    }

    Ok(config)
}

/// Loads settings from `ITDESK_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_default_config() -> Result<Config> {
    let path =
        std::env::var("ITDESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if !Path::new(&path).exists() {
        info!("No configuration file at {path}, using defaults");
        return Ok(Config::default());
    }

    load_config(path)
}
