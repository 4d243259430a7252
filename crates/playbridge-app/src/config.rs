//! Configuration for Play Bridge
//!
//! Supports:
//! - `playbridge.toml` - bridge-wide settings
//! - host check parameters (`immediate`, `flexible_days`) passed to `start_check`

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use playbridge_core::prelude::*;

/// Default settings file name
pub const SETTINGS_FILENAME: &str = "playbridge.toml";

/// Bridge settings (`playbridge.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub update: UpdateSettings,

    #[serde(default)]
    pub events: EventSettings,
}

/// `[update]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateSettings {
    /// Staleness gate used when the host omits `flexible_days`
    #[serde(default = "default_flexible_days")]
    pub flexible_days: u32,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            flexible_days: default_flexible_days(),
        }
    }
}

fn default_flexible_days() -> u32 {
    1
}

/// `[events]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventSettings {
    /// Emit `operation_failed` for best-effort failures instead of staying silent
    #[serde(default)]
    pub report_failures: bool,
}

/// Parse settings from TOML text
pub fn parse_settings(content: &str) -> Result<BridgeSettings> {
    Ok(toml::from_str(content)?)
}

/// Load settings from a file, falling back to defaults.
///
/// A missing file is normal; an unreadable or invalid one is logged.
pub fn load_settings(path: &Path) -> BridgeSettings {
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return BridgeSettings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                BridgeSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            BridgeSettings::default()
        }
    }
}

/// Parameters of one update check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckConfig {
    pub immediate: bool,
    #[serde(default = "default_flexible_days")]
    pub flexible_days: u32,
}

impl CheckConfig {
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            flexible_days: default_flexible_days(),
        }
    }

    pub fn flexible(days: u32) -> Self {
        Self {
            immediate: false,
            flexible_days: days,
        }
    }

    /// Parse the host's check dictionary.
    ///
    /// `immediate` is required and must be a boolean. `flexible_days` is
    /// optional, must be a non-negative integer, and defaults to `default_days`.
    pub fn from_params(params: &Value, default_days: u32) -> Result<Self> {
        let map = params
            .as_object()
            .ok_or_else(|| Error::config_invalid("check parameters must be a dictionary"))?;

        let immediate = match map.get("immediate") {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(Error::config_invalid(format!(
                    "'immediate' must be a boolean, got {other}"
                )))
            }
            None => return Err(Error::config_invalid("'immediate' is required")),
        };

        let flexible_days = match map.get("flexible_days") {
            None | Some(Value::Null) => default_days,
            Some(v) => v
                .as_u64()
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| {
                    Error::config_invalid(format!(
                        "'flexible_days' must be a non-negative integer, got {v}"
                    ))
                })?,
        };

        Ok(Self {
            immediate,
            flexible_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.update.flexible_days, 1);
        assert!(!settings.events.report_failures);
    }

    #[test]
    fn test_parse_partial_settings() {
        let settings = parse_settings(
            r#"
            [events]
            report_failures = true
            "#,
        )
        .unwrap();
        assert!(settings.events.report_failures);
        assert_eq!(settings.update.flexible_days, 1);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempdir().unwrap();
        let settings = load_settings(&dir.path().join(SETTINGS_FILENAME));
        assert_eq!(settings, BridgeSettings::default());
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, "[update]\nflexible_days = 4\n").unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.update.flexible_days, 4);
    }

    #[test]
    fn test_load_settings_invalid_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, "[update\nflexible_days = ").unwrap();

        assert_eq!(load_settings(&path), BridgeSettings::default());
    }

    #[test]
    fn test_check_config_from_params() {
        let config = CheckConfig::from_params(&json!({"immediate": false, "flexible_days": 5}), 1)
            .unwrap();
        assert_eq!(config, CheckConfig::flexible(5));

        let config = CheckConfig::from_params(&json!({"immediate": true}), 3).unwrap();
        assert!(config.immediate);
        assert_eq!(config.flexible_days, 3);
    }

    #[test]
    fn test_check_config_rejects_bad_params() {
        assert!(CheckConfig::from_params(&json!({}), 1).is_err());
        assert!(CheckConfig::from_params(&json!({"immediate": "yes"}), 1).is_err());
        assert!(
            CheckConfig::from_params(&json!({"immediate": false, "flexible_days": -2}), 1).is_err()
        );
        assert!(CheckConfig::from_params(&json!([true]), 1).is_err());
    }
}
