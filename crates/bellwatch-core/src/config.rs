//! Configuration loading and typed config structures for Bellwatch.
//!
//! The configuration lives in `bellwatch-config.yaml`. Every section is
//! optional; an empty file yields the defaults (built-in schedules, live
//! mode, five-second playback cadence).
//!
//! A few settings can be overridden from the environment:
//!
//! - `BELLWATCH_SCHEDULES_FILE` overrides `schedules.file`
//! - `BELLWATCH_PLAYBACK_FILE` overrides `playback.file`
//! - `BELLWATCH_CADENCE_SECS` overrides `playback.cadence_secs`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bellwatch_types::{ScheduleBook, ScheduleKind, ScheduleRecord};
use chrono::NaiveTime;
use serde::Deserialize;
use tracing::warn;

use crate::cadence::{self, Cadence, CadenceError};
use crate::schedule::{self, ScheduleError};
use crate::sequence::{self, TimeParseError};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// `playback.cadence_secs` is out of range.
    #[error("invalid playback cadence: {source}")]
    Cadence {
        /// The underlying validation error.
        #[from]
        source: CadenceError,
    },

    /// `playback.manual_time` is not a recognized time.
    #[error("invalid manual time: {source}")]
    ManualTime {
        /// The underlying parse error.
        #[from]
        source: TimeParseError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Bellwatch configuration.
///
/// Mirrors the structure of `bellwatch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BellwatchConfig {
    /// Where schedules come from.
    #[serde(default)]
    pub schedules: ScheduleSourceConfig,

    /// Playback and manual test-time settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Live wall-clock mode settings.
    #[serde(default)]
    pub live: LiveConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BellwatchConfig {
    /// Load configuration from a YAML file, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse_yaml(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_yaml(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document means all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override file settings with `BELLWATCH_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("BELLWATCH_SCHEDULES_FILE") {
            self.schedules.file = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("BELLWATCH_PLAYBACK_FILE") {
            self.playback.file = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("BELLWATCH_CADENCE_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) => self.playback.cadence_secs = secs,
                Err(err) => {
                    warn!(value = %val, %err, "Ignoring unparseable BELLWATCH_CADENCE_SECS");
                }
            }
        }
    }

    /// Build the schedule book described by this configuration.
    ///
    /// A schedule file takes precedence over inline definitions; with
    /// neither, the built-in book is used.
    ///
    /// # Errors
    ///
    /// Returns any error from [`schedule::load_schedule_file`].
    pub fn load_schedule_book(&self) -> Result<ScheduleBook, ScheduleError> {
        if let Some(path) = &self.schedules.file {
            return schedule::load_schedule_file(path);
        }
        if !self.schedules.definitions.is_empty() {
            return Ok(schedule::build_book(&self.schedules.definitions));
        }
        Ok(schedule::default_book())
    }
}

/// Schedule source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleSourceConfig {
    /// Path to a `schedules.json` document.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Schedules defined inline, keyed by kind.
    #[serde(default)]
    pub definitions: BTreeMap<ScheduleKind, ScheduleRecord>,
}

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaybackConfig {
    /// Time sequence file; when set, the engine runs in playback mode.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Seconds between playback ticks (1 to 60).
    #[serde(default = "default_cadence_secs")]
    pub cadence_secs: u64,

    /// Fixed test time; when set without a file, the engine runs in
    /// manual mode.
    #[serde(default)]
    pub manual_time: Option<String>,
}

impl PlaybackConfig {
    /// The validated cadence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cadence`] if `cadence_secs` is out of range.
    pub fn cadence(&self) -> Result<Cadence, ConfigError> {
        Ok(Cadence::from_secs(self.cadence_secs)?)
    }

    /// The parsed manual time, if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ManualTime`] if the value is not a
    /// recognized time.
    pub fn manual_time(&self) -> Result<Option<NaiveTime>, ConfigError> {
        Ok(self
            .manual_time
            .as_deref()
            .map(sequence::parse_time_of_day)
            .transpose()?)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            file: None,
            cadence_secs: default_cadence_secs(),
            manual_time: None,
        }
    }
}

/// Live mode configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveConfig {
    /// Seconds between re-resolutions against the wall clock.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_cadence_secs() -> u64 {
    cadence::DEFAULT_CADENCE_SECS
}

const fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn parse_without_env(yaml: &str) -> BellwatchConfig {
        BellwatchConfig::parse_yaml(yaml).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        let config = BellwatchConfig::default();
        assert_eq!(config.playback.cadence_secs, 5);
        assert_eq!(config.live.refresh_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.schedules.file.is_none());
        assert_eq!(config.playback.cadence().unwrap(), Cadence::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
schedules:
  definitions:
    regular:
      name: "Test Bells"
      periods:
        - { name: "1", start: "08:00", end: "08:45" }
        - { name: "Lunch", start: "11:00", end: "11:30" }
    homeroom_schedule:
      periods:
        - { name: "Homeroom", start: "07:25", end: "07:35" }

playback:
  file: "times.txt"
  cadence_secs: 2
  manual_time: "10:15 AM"

live:
  refresh_interval_secs: 30

logging:
  level: "debug"
"#;
        let config = parse_without_env(yaml);
        assert_eq!(config.schedules.definitions.len(), 2);
        assert_eq!(config.playback.file, Some(PathBuf::from("times.txt")));
        assert_eq!(config.playback.cadence().unwrap().as_millis(), 2000);
        assert_eq!(config.playback.manual_time().unwrap(), Some(hm(10, 15)));
        assert_eq!(config.live.refresh_interval_secs, 30);
        assert_eq!(config.logging.level, "debug");

        let book = config.load_schedule_book().unwrap();
        assert_eq!(book.periods(ScheduleKind::Regular).len(), 2);
        assert_eq!(book.periods(ScheduleKind::Homeroom).len(), 1);
        assert!(book.get(ScheduleKind::TwoHourDelay).is_none());
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = parse_without_env("playback:\n  cadence_secs: 10\n");
        assert_eq!(config.playback.cadence_secs, 10);
        assert_eq!(config.live.refresh_interval_secs, 60);
        assert!(config.playback.manual_time().unwrap().is_none());
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(parse_without_env(""), BellwatchConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(matches!(
            BellwatchConfig::parse_yaml("playback: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn out_of_range_cadence_is_an_error() {
        let config = parse_without_env("playback:\n  cadence_secs: 0\n");
        assert!(matches!(
            config.playback.cadence(),
            Err(ConfigError::Cadence { .. })
        ));
    }

    #[test]
    fn bad_manual_time_is_an_error() {
        let config = parse_without_env("playback:\n  manual_time: \"noonish\"\n");
        assert!(matches!(
            config.playback.manual_time(),
            Err(ConfigError::ManualTime { .. })
        ));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = parse_without_env("playback:\n  cadence_secs: 10\n");
        config.apply_overrides(|key| match key {
            "BELLWATCH_SCHEDULES_FILE" => Some(String::from("/etc/bells.json")),
            "BELLWATCH_CADENCE_SECS" => Some(String::from(" 3 ")),
            _ => None,
        });
        assert_eq!(
            config.schedules.file,
            Some(PathBuf::from("/etc/bells.json"))
        );
        assert_eq!(config.playback.cadence_secs, 3);
        assert!(config.playback.file.is_none());
    }

    #[test]
    fn unparseable_cadence_override_is_ignored() {
        let mut config = BellwatchConfig::default();
        config.apply_overrides(|key| {
            (key == "BELLWATCH_CADENCE_SECS").then(|| String::from("fast"))
        });
        assert_eq!(config.playback.cadence_secs, 5);
    }

    #[test]
    fn without_sources_the_built_in_book_is_used() {
        let book = BellwatchConfig::default().load_schedule_book().unwrap();
        assert_eq!(book.len(), ScheduleKind::ALL.len());
    }

    #[test]
    fn schedule_file_takes_precedence() {
        let mut config = BellwatchConfig::default();
        config.schedules.file = Some(PathBuf::from("/nonexistent/bellwatch.json"));
        assert!(matches!(
            config.load_schedule_book(),
            Err(ScheduleError::Io { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("bellwatch-config.yaml");
        if path.exists() {
            let config = BellwatchConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
