//! Scenario files for the headless runner
//!
//! A scenario describes how the simulated vendor behaves and what the host
//! does, step by step:
//!
//! ```toml
//! [identity]
//! cached_account = "ada"
//!
//! [update.info]
//! package_name = "com.example.game"
//! availability = "available"
//! staleness_days = 7
//! flexible_allowed = true
//!
//! [[steps]]
//! command = "initialize"
//!
//! [[steps]]
//! command = "start_check"
//! params = { immediate = false, flexible_days = 5 }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use playbridge_core::prelude::*;
use playbridge_core::UpdateMode;
use playbridge_vendor::sim::{IdentityScript, UpdateScript};
use playbridge_vendor::{AppUpdateInfo, InstallStatus};

/// A scripted run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub identity: IdentityScript,

    #[serde(default)]
    pub update: UpdateScript,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One host action or simulated vendor/host occurrence
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Step {
    // ─────────────────────────────────────────────────────────
    // Host commands
    // ─────────────────────────────────────────────────────────
    Initialize,
    SignIn,
    SignOut,
    IncreaseAchievement {
        achievement: String,
        #[serde(default = "default_steps")]
        steps: u32,
    },
    UnlockAchievement {
        achievement: String,
    },
    SubmitScore {
        leaderboard: String,
        score: i64,
    },
    LoadTopScore {
        leaderboard: String,
        #[serde(default = "default_max_scores")]
        max: u32,
    },
    LoadCurrentPlayerScore {
        leaderboard: String,
    },
    ShowAchievements,
    ShowLeaderboard {
        leaderboard: String,
    },
    ShowAllLeaderboards,
    Record,
    /// Check parameters exactly as the host would pass them
    StartCheck {
        params: Value,
    },
    StartUpdate {
        mode: UpdateMode,
        #[serde(default)]
        allow_asset_pack_deletion: bool,
    },
    CompleteUpdate,

    // ─────────────────────────────────────────────────────────
    // Host lifecycle
    // ─────────────────────────────────────────────────────────
    ActivityResult {
        request_code: i32,
        result_code: i32,
        #[serde(default)]
        payload: Option<Value>,
    },
    Resume,
    Teardown,

    // ─────────────────────────────────────────────────────────
    // Simulator controls
    // ─────────────────────────────────────────────────────────
    /// Install-state change pushed by the update service
    PushInstallState {
        status: InstallStatus,
    },
    /// Replace what later update-info queries return; omit to make them fail
    SetUpdateInfo {
        #[serde(default)]
        info: Option<AppUpdateInfo>,
    },
    /// Make the host reject the next `count` foreground launches
    FailNextLaunches {
        count: usize,
    },
}

fn default_steps() -> u32 {
    1
}

fn default_max_scores() -> u32 {
    25
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed scenario")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::parse(
            r#"
            name = "flexible"

            [[steps]]
            command = "initialize"

            [[steps]]
            command = "start_check"
            params = { immediate = false, flexible_days = 5 }

            [[steps]]
            command = "activity_result"
            request_code = 0x001
            result_code = -1

            [[steps]]
            command = "start_update"
            mode = "FLEXIBLE"
            "#,
        )
        .unwrap();

        assert_eq!(scenario.display_name(), "flexible");
        assert_eq!(scenario.steps[0], Step::Initialize);
        assert_eq!(
            scenario.steps[1],
            Step::StartCheck {
                params: json!({"immediate": false, "flexible_days": 5})
            }
        );
        assert_eq!(
            scenario.steps[2],
            Step::ActivityResult {
                request_code: 1,
                result_code: -1,
                payload: None
            }
        );
        assert_eq!(
            scenario.steps[3],
            Step::StartUpdate {
                mode: UpdateMode::Flexible,
                allow_asset_pack_deletion: false
            }
        );
    }

    #[test]
    fn test_defaults() {
        let scenario = Scenario::parse(
            r#"
            [[steps]]
            command = "load_top_score"
            leaderboard = "weekly"
            "#,
        )
        .unwrap();

        assert!(scenario.identity.available);
        assert!(scenario.update.info.is_none());
        assert_eq!(
            scenario.steps[0],
            Step::LoadTopScore {
                leaderboard: "weekly".to_string(),
                max: 25
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let result = Scenario::parse(
            r#"
            [[steps]]
            command = "reboot"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Scenario::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }
}
