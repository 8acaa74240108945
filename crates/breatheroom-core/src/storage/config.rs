//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session length and quote cadence
//! - Breathing phase length
//! - Audio cue clips
//! - Decorative scene settings
//!
//! Configuration is stored at `~/.config/breatheroom/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::audio::AudioCue;
use crate::error::ConfigError;
use crate::scene::{DEFAULT_PARTICLE_COUNT, DEFAULT_REVEAL_THRESHOLD};
use crate::session::SessionSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_length_secs")]
    pub length_secs: u32,
    #[serde(default = "default_quote_every_secs")]
    pub quote_every_secs: u32,
    #[serde(default = "default_quote_fade_ms")]
    pub quote_fade_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_phase_secs")]
    pub phase_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_breathe_in_clip")]
    pub breathe_in_clip: String,
    #[serde(default = "default_breathe_out_clip")]
    pub breathe_out_clip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    #[serde(default = "default_reveal_threshold")]
    pub reveal_threshold: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breatheroom/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

fn default_length_secs() -> u32 {
    300
}
fn default_quote_every_secs() -> u32 {
    5
}
fn default_quote_fade_ms() -> u64 {
    1000
}
fn default_phase_secs() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_breathe_in_clip() -> String {
    AudioCue::BreatheIn.default_clip().into()
}
fn default_breathe_out_clip() -> String {
    AudioCue::BreatheOut.default_clip().into()
}
fn default_particle_count() -> usize {
    DEFAULT_PARTICLE_COUNT
}
fn default_reveal_threshold() -> f64 {
    DEFAULT_REVEAL_THRESHOLD
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            length_secs: default_length_secs(),
            quote_every_secs: default_quote_every_secs(),
            quote_fade_ms: default_quote_fade_ms(),
        }
    }
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            phase_secs: default_phase_secs(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            breathe_in_clip: default_breathe_in_clip(),
            breathe_out_clip: default_breathe_out_clip(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
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
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(n) if n.is_f64() => value
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as whole number")))?,
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
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
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation. The config is left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("session.length_secs", self.session.length_secs),
            ("session.quote_every_secs", self.session.quote_every_secs),
            ("breathing.phase_secs", self.breathing.phase_secs),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.scene.reveal_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "scene.reveal_threshold".into(),
                message: "must be between 0 and 1".into(),
            });
        }
        Ok(())
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            length_secs: self.session.length_secs,
            phase_secs: self.breathing.phase_secs,
            quote_every_secs: self.session.quote_every_secs,
            quote_fade_ms: self.session.quote_fade_ms,
        }
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
    fn defaults_match_session_settings() {
        assert_eq!(Config::default().settings(), SessionSettings::default());
        assert_eq!(Config::default().scene.particle_count, 50);
        assert_eq!(
            Config::default().audio.breathe_in_clip,
            "breathe-in-87397.mp3"
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[session]\nlength_secs = 600\n").unwrap();
        assert_eq!(cfg.session.length_secs, 600);
        assert_eq!(cfg.session.quote_every_secs, 5);
        assert_eq!(cfg.breathing.phase_secs, 4);
        assert_eq!(cfg.settings().credited_minutes(), 10);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.length_secs").as_deref(), Some("300"));
        assert_eq!(cfg.get("audio.enabled").as_deref(), Some("true"));
        assert_eq!(
            cfg.get("audio.breathe_out_clip").as_deref(),
            Some("breath-out-242642.mp3")
        );
        assert!(cfg.get("audio.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("audio.enabled", "false").unwrap();
        cfg.set("breathing.phase_secs", "5").unwrap();
        cfg.set("scene.reveal_threshold", "0.25").unwrap();
        cfg.set("audio.breathe_in_clip", "in.ogg").unwrap();
        assert!(!cfg.audio.enabled);
        assert_eq!(cfg.breathing.phase_secs, 5);
        assert_eq!(cfg.scene.reveal_threshold, 0.25);
        assert_eq!(cfg.audio.breathe_in_clip, "in.ogg");
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("audio.volume", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("audio", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("audio.enabled", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("session.length_secs", "-3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("breathing.phase_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut edited = cfg.clone();
        edited.set("session.quote_every_secs", "10").unwrap();
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().session.quote_every_secs, 10);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[breathing]\nphase_secs = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
