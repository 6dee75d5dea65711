//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lp_core::{LayoutConfig, WeekStart};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// First day shown in the week view.
    /// Default: sunday.
    #[serde(default)]
    pub week_starts_on: WeekStart,

    /// Calendar grid geometry.
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("week_starts_on", &self.week_starts_on)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("lifepulse.db"),
            week_starts_on: WeekStart::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // LP_DATABASE_PATH, LP_LAYOUT__HOUR_HEIGHT, ...
        figment = figment.merge(Env::prefixed("LP_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for LifePulse.
///
/// On Linux: `~/.config/lifepulse`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lifepulse"))
}

/// Returns the platform-specific data directory for LifePulse.
///
/// On Linux: `~/.local/share/lifepulse`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("lifepulse"))
}
