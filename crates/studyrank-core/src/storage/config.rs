//! TOML-based application configuration.
//!
//! Stores:
//! - The local profile name the CLI tracks
//! - Timer defaults (subject, log listing length)
//! - An optional custom tier ladder overriding the built-in one
//!
//! Configuration is stored at `~/.config/studyrank/config.toml`. The ladder
//! section is validated when the ladder is built; an invalid custom ladder
//! rejects startup rather than silently falling back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, CoreError, Result};
use crate::tier::{TierDef, TierLadder};

use super::data_dir;

/// Profile configuration. One local user, no authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_username")]
    pub username: String,
}

/// Timer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Subject used when `session start` is given none.
    #[serde(default = "default_subject")]
    pub default_subject: String,
    /// How many entries `log list` shows by default.
    #[serde(default = "default_log_limit")]
    pub log_limit: u32,
}

/// Optional custom ladder. When `tiers` is set it fully replaces the
/// built-in ladder and must satisfy the same invariants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LadderConfig {
    #[serde(default)]
    pub tiers: Option<Vec<TierDef>>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyrank/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
}

fn default_username() -> String {
    "default".into()
}
fn default_subject() -> String {
    "General".into()
}
fn default_log_limit() -> u32 {
    10
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_subject: default_subject(),
            log_limit: default_log_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            timer: TimerConfig::default(),
            ladder: LadderConfig::default(),
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
    ) -> Result<()> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::InvalidValue {
                key: key.into(),
                message: "config key is empty".into(),
            }
            .into());
        }

        let unknown = |key: &str| -> CoreError {
            ConfigError::InvalidValue {
                key: key.into(),
                message: "unknown config key".into(),
            }
            .into()
        };
        let bad_value = |key: &str, message: String| -> CoreError {
            ConfigError::InvalidValue {
                key: key.into(),
                message,
            }
            .into()
        };

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(|| unknown(key))?;
                let existing = obj.get(part).ok_or_else(|| unknown(key))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| bad_value(key, e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(bad_value(
                                key,
                                format!("cannot parse '{value}' as number"),
                            ));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| bad_value(key, e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(|| unknown(key))?;
        }

        Err(unknown(key))
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| {
                    ConfigError::LoadFailed {
                        path,
                        message: e.to_string(),
                    }
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// The tier ladder to run with: the custom one if configured, the
    /// built-in one otherwise.
    ///
    /// # Errors
    /// Returns an error if a configured custom ladder violates the static
    /// ladder invariants. Startup must fail in that case.
    pub fn tier_ladder(&self) -> Result<TierLadder> {
        match &self.ladder.tiers {
            Some(tiers) => Ok(TierLadder::new(tiers.clone())?),
            None => Ok(TierLadder::builtin()),
        }
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

    /// Set a config value by key and persist. Returns error if the key is
    /// unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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
        assert_eq!(parsed.profile.username, "default");
        assert_eq!(parsed.timer.default_subject, "General");
        assert_eq!(parsed.timer.log_limit, 10);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("profile.username").as_deref(), Some("default"));
        assert_eq!(cfg.get("timer.log_limit").as_deref(), Some("10"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "timer.default_subject", "Physics").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "timer.default_subject").unwrap(),
            &serde_json::Value::String("Physics".to_string())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "timer.log_limit", "25").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "timer.log_limit").unwrap(),
            &serde_json::Value::Number(25.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "timer.nonexistent", "value");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "timer.log_limit", "not_a_number");
        assert!(result.is_err());
    }

    #[test]
    fn no_custom_ladder_uses_builtin() {
        let cfg = Config::default();
        let ladder = cfg.tier_ladder().unwrap();
        assert_eq!(ladder.len(), 20);
        assert_eq!(ladder.name(0), "Rookie");
    }

    #[test]
    fn custom_ladder_is_validated() {
        let toml_str = r#"
            [[ladder.tiers]]
            name = "Only"
            floor = 50
            ceiling = 100
            daily_required = 0
            max_gain = 10
            min_loss = 0
            avoid_fall = true
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        // Floor 50 on the first tier violates the zero-base invariant.
        assert!(cfg.tier_ladder().is_err());
    }

    #[test]
    fn custom_ladder_parses_from_toml() {
        let toml_str = r#"
            [[ladder.tiers]]
            name = "Low"
            floor = 0
            ceiling = 100
            daily_required = 0
            max_gain = 80
            min_loss = 0
            avoid_fall = true

            [[ladder.tiers]]
            name = "High"
            floor = 100
            ceiling = 300
            daily_required = 10
            max_gain = 100
            min_loss = -25
            avoid_fall = false
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        let ladder = cfg.tier_ladder().unwrap();
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder.name(1), "High");
    }
}
