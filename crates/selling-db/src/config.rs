//! # Backend Configuration
//!
//! Identities and connection targets of the three storage backends.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  1. Environment Variables (highest priority)                    │   │
//! │  │     SELLING_PRIMARY_DB, SELLING_SECONDARY_DB,                   │   │
//! │  │     SELLING_TERTIARY_DB                                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              ▲                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  2. Config File (backends.toml)                                 │   │
//! │  │     [primary] / [secondary] / [tertiary] tables                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              ▲                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  3. Default Values (lowest priority)                            │   │
//! │  │     ./data/selling-<id>.db                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [primary]
//! database_path = "/var/lib/selling/primary.db"
//!
//! [secondary]
//! database_path = "/var/lib/selling/secondary.db"
//! busy_timeout_ms = 10000
//!
//! [tertiary]
//! database_path = "/mnt/archive/tertiary.db"
//! create_if_missing = false
//! ```
//!
//! Each repository is bound to one backend at construction and never
//! re-routed. Nothing is shared between backends.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

// =============================================================================
// Backend Identity
// =============================================================================

/// Names one independently configured storage target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// The default backend.
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

impl BackendId {
    /// All identities in declaration order.
    pub const ALL: [BackendId; 3] = [BackendId::Primary, BackendId::Secondary, BackendId::Tertiary];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendId::Primary => "primary",
            BackendId::Secondary => "secondary",
            BackendId::Tertiary => "tertiary",
        }
    }

    /// Environment variable overriding this backend's database path.
    pub const fn env_var(&self) -> &'static str {
        match self {
            BackendId::Primary => "SELLING_PRIMARY_DB",
            BackendId::Secondary => "SELLING_SECONDARY_DB",
            BackendId::Tertiary => "SELLING_TERTIARY_DB",
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(BackendId::Primary),
            "secondary" => Ok(BackendId::Secondary),
            "tertiary" => Ok(BackendId::Tertiary),
            other => Err(DbError::Config(format!(
                "Unknown backend: '{}'. Valid options: primary, secondary, tertiary",
                other
            ))),
        }
    }
}

// =============================================================================
// Single Backend
// =============================================================================

/// Connection target of one backend.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use selling_db::{BackendConfig, BackendId};
///
/// let config = BackendConfig::new(BackendId::Secondary, "/tmp/secondary.db")
///     .busy_timeout(Duration::from_secs(2))
///     .create_if_missing(false);
///
/// assert_eq!(config.busy_timeout_ms, 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Filled in from the table name when loaded from a file.
    #[serde(skip)]
    pub id: BackendId,

    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// How long a connection waits on a locked database.
    /// Default: 5000 ms
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Whether opening a scope may create the database file.
    /// Default: true
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl BackendConfig {
    /// Creates a backend configuration with default timeouts.
    pub fn new(id: BackendId, path: impl Into<PathBuf>) -> Self {
        BackendConfig {
            id,
            database_path: path.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            create_if_missing: true,
        }
    }

    /// Sets the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets whether a missing database file is created.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Default location of a backend's database file.
    pub fn default_path(id: BackendId) -> PathBuf {
        PathBuf::from(format!("./data/selling-{}.db", id))
    }

    /// SQLite options used for every connection to this backend.
    ///
    /// - WAL mode, so readers on other scopes are not blocked
    /// - Foreign keys enabled (SQLite ships them disabled)
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database_path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .create_if_missing(self.create_if_missing)
    }
}

// =============================================================================
// All Backends
// =============================================================================

/// One [`BackendConfig`] per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default = "default_primary")]
    pub primary: BackendConfig,

    #[serde(default = "default_secondary")]
    pub secondary: BackendConfig,

    #[serde(default = "default_tertiary")]
    pub tertiary: BackendConfig,
}

fn default_backend(id: BackendId) -> BackendConfig {
    BackendConfig::new(id, BackendConfig::default_path(id))
}

fn default_primary() -> BackendConfig {
    default_backend(BackendId::Primary)
}

fn default_secondary() -> BackendConfig {
    default_backend(BackendId::Secondary)
}

fn default_tertiary() -> BackendConfig {
    default_backend(BackendId::Tertiary)
}

impl Default for BackendsConfig {
    fn default() -> Self {
        BackendsConfig {
            primary: default_primary(),
            secondary: default_secondary(),
            tertiary: default_tertiary(),
        }
    }
}

impl BackendsConfig {
    /// Places all three backends as `selling-<id>.db` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let backend = |id: BackendId| BackendConfig::new(id, dir.join(format!("selling-{}.db", id)));

        BackendsConfig {
            primary: backend(BackendId::Primary),
            secondary: backend(BackendId::Secondary),
            tertiary: backend(BackendId::Tertiary),
        }
    }

    /// Loads configuration from defaults, an optional TOML file and the
    /// environment, in that order.
    pub fn load(config_path: Option<&Path>) -> DbResult<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading backend config from file");
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    DbError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses a TOML document; missing tables keep their defaults.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        let mut config: BackendsConfig =
            toml::from_str(contents).map_err(|e| DbError::Config(e.to_string()))?;
        config.assign_ids();
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> DbResult<String> {
        toml::to_string_pretty(self).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Returns the configuration of one backend.
    pub fn get(&self, id: BackendId) -> &BackendConfig {
        match id {
            BackendId::Primary => &self.primary,
            BackendId::Secondary => &self.secondary,
            BackendId::Tertiary => &self.tertiary,
        }
    }

    fn get_mut(&mut self, id: BackendId) -> &mut BackendConfig {
        match id {
            BackendId::Primary => &mut self.primary,
            BackendId::Secondary => &mut self.secondary,
            BackendId::Tertiary => &mut self.tertiary,
        }
    }

    /// Iterates over all backends in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendConfig> {
        BackendId::ALL.into_iter().map(move |id| self.get(id))
    }

    fn assign_ids(&mut self) {
        for id in BackendId::ALL {
            self.get_mut(id).id = id;
        }
    }

    fn apply_env_overrides(&mut self) {
        for id in BackendId::ALL {
            if let Ok(path) = std::env::var(id.env_var()) {
                debug!(backend = %id, path = %path, "Overriding database path from environment");
                self.get_mut(id).database_path = PathBuf::from(path);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id_parse_and_display() {
        assert_eq!("primary".parse::<BackendId>().unwrap(), BackendId::Primary);
        assert_eq!("SECONDARY".parse::<BackendId>().unwrap(), BackendId::Secondary);
        assert_eq!(" Tertiary ".parse::<BackendId>().unwrap(), BackendId::Tertiary);
        assert!("quaternary".parse::<BackendId>().is_err());

        assert_eq!(BackendId::Tertiary.to_string(), "tertiary");
        assert_eq!(BackendId::default(), BackendId::Primary);
    }

    #[test]
    fn test_defaults() {
        let config = BackendsConfig::default();
        assert_eq!(config.secondary.id, BackendId::Secondary);
        assert_eq!(
            config.secondary.database_path,
            PathBuf::from("./data/selling-secondary.db")
        );
        assert_eq!(config.primary.busy_timeout_ms, 5_000);
        assert!(config.tertiary.create_if_missing);
    }

    #[test]
    fn test_from_toml_fills_missing_tables() {
        let config = BackendsConfig::from_toml(
            r#"
            [secondary]
            database_path = "/tmp/other.db"
            busy_timeout_ms = 250
            create_if_missing = false
            "#,
        )
        .unwrap();

        assert_eq!(config.secondary.id, BackendId::Secondary);
        assert_eq!(config.secondary.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.secondary.busy_timeout_ms, 250);
        assert!(!config.secondary.create_if_missing);

        assert_eq!(config.primary, default_primary());
        assert_eq!(config.tertiary, default_tertiary());
    }

    #[test]
    fn test_from_toml_rejects_malformed() {
        let err = BackendsConfig::from_toml("[primary]\ndatabase_path = 42").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip_keeps_ids() {
        let config = BackendsConfig::in_dir("/srv/selling");
        let parsed = BackendsConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_in_dir_separates_backends() {
        let config = BackendsConfig::in_dir("/srv/selling");
        let paths: Vec<_> = config.iter().map(|b| b.database_path.clone()).collect();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], PathBuf::from("/srv/selling/selling-primary.db"));
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[1], paths[2]);
    }

    #[test]
    fn test_builder() {
        let config = BackendConfig::new(BackendId::Tertiary, "/tmp/t.db")
            .busy_timeout(Duration::from_millis(1500))
            .create_if_missing(false);

        assert_eq!(config.id, BackendId::Tertiary);
        assert_eq!(config.busy_timeout_ms, 1500);
        assert!(!config.create_if_missing);
    }
}
