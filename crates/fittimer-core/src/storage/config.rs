//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default HIIT work/rest/rounds
//! - Minimum durations below which finished runs are not recorded
//! - Feedback cue rendering
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::events::ExerciseType;
use crate::timer::IntervalConfig;

/// Interval settings used when none are given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiitDefaults {
    #[serde(default = "default_work_secs")]
    pub work_secs: u32,
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

/// Caller-side discard policy for short runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_plank_min_secs")]
    pub plank_min_secs: u64,
    #[serde(default = "default_hiit_min_secs")]
    pub hiit_min_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell on cues.
    #[serde(default = "default_true")]
    pub bell: bool,
    /// Render the 3-2-1 countdown cues.
    #[serde(default = "default_true")]
    pub warning: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hiit: HiitDefaults,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

fn default_work_secs() -> u32 {
    30
}
fn default_rest_secs() -> u32 {
    10
}
fn default_rounds() -> u32 {
    8
}
fn default_plank_min_secs() -> u64 {
    5
}
fn default_hiit_min_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for HiitDefaults {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            rest_secs: default_rest_secs(),
            rounds: default_rounds(),
        }
    }
}

impl HiitDefaults {
    pub fn interval_config(&self) -> Result<IntervalConfig, ValidationError> {
        IntervalConfig::new(self.work_secs, self.rest_secs, self.rounds)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            plank_min_secs: default_plank_min_secs(),
            hiit_min_secs: default_hiit_min_secs(),
        }
    }
}

impl RecordingConfig {
    pub fn minimum_secs(&self, exercise: ExerciseType) -> u64 {
        match exercise {
            ExerciseType::Plank => self.plank_min_secs,
            ExerciseType::Hiit => self.hiit_min_secs,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
            warning: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|e| invalid(e.to_string()))?,
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("not a leaf value".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is not a valid configuration.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if key.starts_with("hiit.") {
            updated
                .hiit
                .interval_config()
                .map_err(|e| invalid(e.to_string()))?;
        }
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[hiit]\nrounds = 12\n").unwrap();
        assert_eq!(parsed.hiit.rounds, 12);
        assert_eq!(parsed.hiit.work_secs, 30);
        assert_eq!(parsed.recording.plank_min_secs, 5);
        assert!(parsed.feedback.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("hiit.work_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("feedback.bell").as_deref(), Some("true"));
        assert!(cfg.get("hiit.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("hiit.rounds", "4").unwrap();
        cfg.set("feedback.warning", "false").unwrap();
        cfg.set("recording.hiit_min_secs", "30").unwrap();
        assert_eq!(cfg.hiit.rounds, 4);
        assert!(!cfg.feedback.warning);
        assert_eq!(cfg.recording.minimum_secs(ExerciseType::Hiit), 30);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("hiit.tempo", "3"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("hiit", "3"), Err(ConfigError::InvalidValue { .. })));
        assert!(cfg.set("feedback.bell", "loud").is_err());
        assert!(cfg.set("hiit.rounds", "-2").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_configs_the_engine_cannot_run() {
        let mut cfg = Config::default();
        assert!(cfg.set("hiit.work_secs", "0").is_err());
        assert!(cfg.set("hiit.rest_secs", "0").is_ok());
        assert!(cfg.set("hiit.rounds", "51").is_err());
        assert_eq!(cfg.hiit.interval_config().unwrap().rest_secs, 0);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, Config::default());

        let mut changed = first;
        changed.set("hiit.work_secs", "45").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().hiit.work_secs, 45);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hiit = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }
}
