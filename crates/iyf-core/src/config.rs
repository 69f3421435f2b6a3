//! Monitor tuning parameters and the settings store that publishes them.

use std::ops::RangeInclusive;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Accepted range for the poll interval, in seconds.
pub const POLL_INTERVAL_RANGE: RangeInclusive<u32> = 15..=120;
/// Accepted range for the lead time, in minutes.
pub const LEAD_TIME_RANGE: RangeInclusive<u32> = 0..=5;
/// Accepted range for the auto-dismiss countdown, in seconds.
pub const AUTO_DISMISS_RANGE: RangeInclusive<u32> = 5..=60;
/// Accepted range for the snooze delay, in minutes.
pub const SNOOZE_RANGE: RangeInclusive<u32> = 1..=15;

/// A setting was outside its accepted range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field} must be between {min} and {max}, got {value}")]
pub struct ConfigError {
    pub field: &'static str,
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

fn check_range(
    field: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// User-tunable monitor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// How often the calendar is polled.
    /// Default: 30 seconds.
    pub poll_interval_seconds: u32,

    /// How long before a meeting starts it becomes eligible for a reminder.
    /// Default: 1 minute.
    pub lead_time_minutes: u32,

    /// Countdown before a reminder dismisses itself.
    /// Default: 10 seconds.
    pub auto_dismiss_seconds: u32,

    /// Delay before a snoozed reminder comes back.
    /// Default: 5 minutes.
    pub snooze_minutes: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
            lead_time_minutes: 1,
            auto_dismiss_seconds: 10,
            snooze_minutes: 5,
        }
    }
}

impl MonitorConfig {
    /// Rejects any value outside its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "poll_interval_seconds",
            self.poll_interval_seconds,
            &POLL_INTERVAL_RANGE,
        )?;
        check_range("lead_time_minutes", self.lead_time_minutes, &LEAD_TIME_RANGE)?;
        check_range(
            "auto_dismiss_seconds",
            self.auto_dismiss_seconds,
            &AUTO_DISMISS_RANGE,
        )?;
        check_range("snooze_minutes", self.snooze_minutes, &SNOOZE_RANGE)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::seconds(i64::from(self.poll_interval_seconds))
    }

    pub fn lead_time(&self) -> Duration {
        Duration::minutes(i64::from(self.lead_time_minutes))
    }

    pub fn snooze(&self) -> Duration {
        Duration::minutes(i64::from(self.snooze_minutes))
    }

    /// Query window `[now - lead, now + max(lead, 1 minute)]` as offsets.
    pub fn query_window(&self) -> (Duration, Duration) {
        let lead = self.lead_time();
        (lead, lead.max(Duration::minutes(1)))
    }
}

/// Holds the current [`MonitorConfig`] and notifies subscribers on change.
///
/// Explicitly constructed and handed to whoever needs it; there is no
/// process-wide instance.
#[derive(Debug)]
pub struct SettingsStore {
    tx: watch::Sender<MonitorConfig>,
}

impl SettingsStore {
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (tx, _rx) = watch::channel(config);
        Ok(Self { tx })
    }

    pub fn current(&self) -> MonitorConfig {
        *self.tx.borrow()
    }

    pub fn poll_interval_seconds(&self) -> u32 {
        self.tx.borrow().poll_interval_seconds
    }

    pub fn lead_time_minutes(&self) -> u32 {
        self.tx.borrow().lead_time_minutes
    }

    pub fn auto_dismiss_seconds(&self) -> u32 {
        self.tx.borrow().auto_dismiss_seconds
    }

    pub fn snooze_minutes(&self) -> u32 {
        self.tx.borrow().snooze_minutes
    }

    /// Publishes a new configuration.
    ///
    /// Returns `Ok(false)` when nothing changed; subscribers are only woken
    /// for real changes.
    pub fn update(&self, config: MonitorConfig) -> Result<bool, ConfigError> {
        config.validate()?;
        Ok(self.tx.send_if_modified(|current| {
            if *current == config {
                false
            } else {
                *current = config;
                true
            }
        }))
    }

    /// Change notification channel.
    pub fn subscribe(&self) -> watch::Receiver<MonitorConfig> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval_seconds, 30);
        assert_eq!(config.lead_time_minutes, 1);
        assert_eq!(config.auto_dismiss_seconds, 10);
        assert_eq!(config.snooze_minutes, 5);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let config = MonitorConfig {
            snooze_minutes: 0,
            ..MonitorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "snooze_minutes must be between 1 and 15, got 0");

        let config = MonitorConfig {
            poll_interval_seconds: 5,
            ..MonitorConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "poll_interval_seconds");
    }

    #[test]
    fn query_window_covers_at_least_a_minute_ahead() {
        let zero = MonitorConfig {
            lead_time_minutes: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(zero.query_window(), (Duration::zero(), Duration::minutes(1)));

        let five = MonitorConfig {
            lead_time_minutes: 5,
            ..MonitorConfig::default()
        };
        assert_eq!(five.query_window(), (Duration::minutes(5), Duration::minutes(5)));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: MonitorConfig = serde_json::from_str(r#"{"snooze_minutes": 3}"#).unwrap();
        assert_eq!(config.snooze_minutes, 3);
        assert_eq!(config.poll_interval_seconds, 30);
    }

    #[test]
    fn store_notifies_only_on_change() {
        let store = SettingsStore::new(MonitorConfig::default()).unwrap();
        let mut rx = store.subscribe();

        assert!(!store.update(MonitorConfig::default()).unwrap());
        assert!(!rx.has_changed().unwrap());

        let faster = MonitorConfig {
            poll_interval_seconds: 15,
            ..MonitorConfig::default()
        };
        assert!(store.update(faster).unwrap());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), faster);
        assert_eq!(store.poll_interval_seconds(), 15);
    }

    #[test]
    fn store_rejects_invalid_update() {
        let store = SettingsStore::new(MonitorConfig::default()).unwrap();
        let bad = MonitorConfig {
            auto_dismiss_seconds: 61,
            ..MonitorConfig::default()
        };
        assert!(store.update(bad).is_err());
        assert_eq!(store.auto_dismiss_seconds(), 10);
    }
}
