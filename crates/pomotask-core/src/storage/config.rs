//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Phase lengths and the long-break interval for auto mode
//! - Whether auto mode is on and whether the next phase starts by itself
//! - The default tag and the tags offered for selection
//! - Which session store backs the history
//!
//! Configuration is stored at `~/.config/pomotask/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::record::normalize_tag;
use crate::timer::PhaseDurations;

pub const CONFIG_FILE: &str = "config.toml";

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u8,
    /// Drive the Work/Break sequence automatically.
    #[serde(default)]
    pub auto_mode: bool,
    /// Begin the next auto-mode phase as soon as the previous one is acknowledged.
    #[serde(default)]
    pub auto_start: bool,
}

/// Tag configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsConfig {
    #[serde(default = "default_tag")]
    pub default: String,
    #[serde(default = "default_known_tags")]
    pub known: Vec<String>,
}

/// Which [`super::SessionStore`] holds the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// JSON Lines file, `sessions.jsonl`.
    #[default]
    Log,
    /// SQLite, `pomotask.db`.
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub session_backend: SessionBackend,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomotask/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_work_minutes() -> u32 {
    PhaseDurations::default().work_minutes
}
fn default_short_break_minutes() -> u32 {
    PhaseDurations::default().short_break_minutes
}
fn default_long_break_minutes() -> u32 {
    PhaseDurations::default().long_break_minutes
}
fn default_long_break_every() -> u8 {
    PhaseDurations::default().long_break_every
}
fn default_tag() -> String {
    "Reading".into()
}
fn default_known_tags() -> Vec<String> {
    ["Reading", "Work", "Health", "Other"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_every: default_long_break_every(),
            auto_mode: false,
            auto_start: false,
        }
    }
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            default: default_tag(),
            known: default_known_tags(),
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
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let parse_err = |what: &str| ConfigError::ParseFailed(format!("cannot parse '{value}' as {what} for {key}"));

            let new_value = match existing {
                serde_json::Value::Bool(_) => {
                    serde_json::Value::Bool(value.parse::<bool>().map_err(|_| parse_err("bool"))?)
                }
                serde_json::Value::Number(_) => {
                    let n = value.parse::<u64>().map_err(|_| parse_err("number"))?;
                    serde_json::Value::Number(n.into())
                }
                // Lists take JSON or a comma-separated shorthand.
                serde_json::Value::Array(_) => match serde_json::from_str(value) {
                    Ok(v @ serde_json::Value::Array(_)) => v,
                    _ => serde_json::Value::Array(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(|s| serde_json::Value::String(s.into()))
                            .collect(),
                    ),
                },
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from disk, writing the default file on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds invalid values, or if the default config cannot be written.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.normalize();
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                info!(path = %path.display(), "wrote default configuration");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        super::write_atomic(path, &content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. `self` is unchanged then.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.normalize();
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Flattened `key = value` pairs for listing.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    fn normalize(&mut self) {
        self.tags.default = normalize_tag(&self.tags.default);
        let mut known: Vec<String> = Vec::with_capacity(self.tags.known.len());
        for tag in self.tags.known.iter().map(|t| normalize_tag(t)) {
            if !tag.is_empty() && !known.contains(&tag) {
                known.push(tag);
            }
        }
        self.tags.known = known;
    }

    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.phase_durations().validate()
    }

    pub fn phase_durations(&self) -> PhaseDurations {
        PhaseDurations {
            work_minutes: self.timer.work_minutes,
            short_break_minutes: self.timer.short_break_minutes,
            long_break_minutes: self.timer.long_break_minutes,
            long_break_every: self.timer.long_break_every,
        }
    }

    /// Tags offered for selection: the known list with the default tag first.
    pub fn tag_choices(&self) -> Vec<String> {
        let mut choices = vec![self.tags.default.clone()];
        choices.extend(self.tags.known.iter().filter(|t| **t != self.tags.default).cloned());
        choices.retain(|t| !t.is_empty());
        choices
    }
}
