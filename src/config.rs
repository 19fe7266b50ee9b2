//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/bonita-migrate/config.toml` (XDG) or platform config dir
//! 2. Project config: `.bonita-migrate.toml`
//! 3. Environment variables: `BONITA_MIGRATE_*` (nested keys separated by `__`)
//!
//! Every key has a default, so running without any file is valid.
//!
//! ```toml
//! [studio]
//! edition = "enterprise"
//!
//! [designer]
//! url = "http://localhost:8080"
//! retries = 10
//! retry_delay_ms = 2000
//!
//! [relocation]
//! temp_prefix = "migration-tmp"
//!
//! [report]
//! enabled = true
//! file_name = "migration_report.md"
//! ```

use std::ops::Deref;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub studio: StudioConfig,
    pub designer: DesignerConfig,
    pub relocation: RelocationConfig,
    pub report: ReportConfig,
}

/// Product edition the migrated project targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[default]
    Community,
    Enterprise,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub edition: Edition,
}

/// UI Designer backend used by the artifacts migration step.
///
/// The step is only contributed to the pipeline when `url` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Base URL of a running UI Designer (e.g. `http://localhost:8080`).
    pub url: Option<String>,
    /// Retries per artifact after the first attempt.
    pub retries: u32,
    /// Fixed delay between two attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            url: None,
            retries: 10,
            retry_delay_ms: 2000,
        }
    }
}

impl DesignerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelocationConfig {
    /// Prefix of the temporary directory holding the project copy.
    pub temp_prefix: String,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            temp_prefix: "migration-tmp".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Write the markdown report at the project root after a migration.
    pub enabled: bool,
    pub file_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_name: "migration_report.md".to_string(),
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment, exposed so callers can merge extra providers.
    pub fn figment() -> Figment {
        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".bonita-migrate.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("BONITA_MIGRATE_").split("__"))
    }

    /// User config path: ~/.config/bonita-migrate/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home
                .join(".config")
                .join("bonita-migrate")
                .join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("bonita-migrate").join("config.toml"))
            .unwrap_or_default()
    }
}
