//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use iyf_core::{ConfigError, MonitorConfig};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the exported calendar file.
    pub calendar_path: PathBuf,
    /// Seconds between calendar checks.
    pub poll_interval_seconds: u32,
    /// Minutes before a meeting starts that its reminder may fire.
    pub lead_time_minutes: u32,
    /// Seconds before a reminder dismisses itself.
    pub auto_dismiss_seconds: u32,
    /// Minutes a snoozed reminder stays away.
    pub snooze_minutes: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("calendar_path", &self.calendar_path)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field("lead_time_minutes", &self.lead_time_minutes)
            .field("auto_dismiss_seconds", &self.auto_dismiss_seconds)
            .field("snooze_minutes", &self.snooze_minutes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let monitor = MonitorConfig::default();
        Self {
            calendar_path: data_dir.join("calendar.json"),
            poll_interval_seconds: monitor.poll_interval_seconds,
            lead_time_minutes: monitor.lead_time_minutes,
            auto_dismiss_seconds: monitor.auto_dismiss_seconds,
            snooze_minutes: monitor.snooze_minutes,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (IYF_*)
        figment = figment.merge(Env::prefixed("IYF_"));

        figment.extract()
    }

    /// The monitor settings, checked against their accepted ranges.
    pub fn monitor(&self) -> Result<MonitorConfig, ConfigError> {
        let monitor = MonitorConfig {
            poll_interval_seconds: self.poll_interval_seconds,
            lead_time_minutes: self.lead_time_minutes,
            auto_dismiss_seconds: self.auto_dismiss_seconds,
            snooze_minutes: self.snooze_minutes,
        };
        monitor.validate()?;
        Ok(monitor)
    }
}

/// Returns the platform-specific config directory for iyf.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("iyf"))
}

/// Returns the platform-specific data directory for iyf.
///
/// On Linux: `~/.local/share/iyf`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("iyf"))
}
