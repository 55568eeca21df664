//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CHECKOUT_DB_PATH=/var/lib/checkout/checkout.db                     │
//! │     CHECKOUT_DB_MAX_CONNECTIONS=10                                     │
//! │     CHECKOUT_COLLABORATOR_TIMEOUT_MS=1500                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/engine/engine.toml (Linux)                               │
//! │     ~/Library/Application Support/com.checkout.engine/engine.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [database]
//! path = "checkout.db"
//! max_connections = 5
//!
//! [collaborators]
//! timeout_ms = 3000   # every catalogue / inventory call
//!
//! [sales]
//! max_items = 100
//! max_item_quantity = 999
//! ```

use std::path::PathBuf;
use std::time::Duration;

use checkout_core::validation::SaleLimits;
use checkout_core::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};
use checkout_db::DbConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// Errors
// =============================================================================

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written.
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`EngineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized for saving.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No path given and no platform config directory.
    #[error("No config path available")]
    NoPath,
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("checkout.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[collaborators]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorSection {
    /// Upper bound for any single catalogue or inventory call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for CollaboratorSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// `[sales]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSection {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,
}

fn default_max_items() -> usize {
    MAX_CART_ITEMS
}

fn default_max_item_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}

impl Default for SalesSection {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_item_quantity: default_max_item_quantity(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub collaborators: CollaboratorSection,

    #[serde(default)]
    pub sales: SalesSection,
}

impl EngineConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from TOML file (if it exists)
    /// 3. Apply environment variable overrides
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.collaborators.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "collaborators.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.sales.max_items == 0 || self.sales.max_item_quantity <= 0 {
            return Err(ConfigError::Invalid(
                "sales limits must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("CHECKOUT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("CHECKOUT_DB_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.database.max_connections = m;
            }
        }

        if let Ok(timeout) = std::env::var("CHECKOUT_COLLABORATOR_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse::<u64>() {
                debug!(timeout_ms = t, "Overriding collaborator timeout from environment");
                self.collaborators.timeout_ms = t;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "checkout", "engine")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Collaborator call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.collaborators.timeout_ms)
    }

    /// Cart limits for request validation.
    pub fn limits(&self) -> SaleLimits {
        SaleLimits {
            max_items: self.sales.max_items,
            max_item_quantity: self.sales.max_item_quantity,
        }
    }

    /// Pool configuration for the configured database.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
