//! Domain types shared by every Play Bridge crate

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────
// Identity Records
// ─────────────────────────────────────────────────────────

/// Profile of the signed-in player.
///
/// Replaced as a whole on every successful profile fetch and cleared as a
/// whole on sign-out. The default value is the "empty" profile returned to
/// the host while disconnected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub title: String,
    pub player_id: String,
    pub display_name: String,
    #[serde(default)]
    pub icon_uri: Option<String>,
}

impl PlayerProfile {
    pub fn is_empty(&self) -> bool {
        self.player_id.is_empty()
    }
}

/// A leaderboard entry converted for the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Leaderboard id the entry was loaded from
    pub name: String,
    pub rank: i64,
    pub display_rank: String,
    pub display_score: String,
    pub raw_score: i64,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
}

// ─────────────────────────────────────────────────────────
// Update Records
// ─────────────────────────────────────────────────────────

/// Update UX mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateMode {
    /// Blocks the app until the install completes
    Immediate,
    /// Downloads in the background, restart is triggered later by the user
    #[default]
    Flexible,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Immediate => "IMMEDIATE",
            UpdateMode::Flexible => "FLEXIBLE",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update the host is allowed to act on (`update_available` payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOffer {
    pub package: String,
    pub version: i64,
    pub mode: UpdateMode,
}

// ─────────────────────────────────────────────────────────
// Request Codes
// ─────────────────────────────────────────────────────────

/// Reserved request codes for foreground flows.
///
/// Every launched flow is tagged with one of these so that the single
/// activity-result funnel can be routed back to the right controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCode {
    /// Vendor update flow (immediate or flexible)
    UpdateFlow,
    /// Achievements presentation UI
    Achievements,
    /// Single or all-leaderboards presentation UI
    Leaderboard,
    /// Interactive sign-in and its failure resolution
    SignIn,
    /// Video capture overlay
    VideoCapture,
}

impl RequestCode {
    pub const ALL: [RequestCode; 5] = [
        RequestCode::UpdateFlow,
        RequestCode::Achievements,
        RequestCode::Leaderboard,
        RequestCode::SignIn,
        RequestCode::VideoCapture,
    ];

    /// Numeric code handed to the host when launching
    pub fn code(self) -> i32 {
        match self {
            RequestCode::UpdateFlow => 0x001,
            RequestCode::Achievements => 0x002,
            RequestCode::Leaderboard => 0x003,
            RequestCode::SignIn => 0x004,
            RequestCode::VideoCapture => 0x005,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|rc| rc.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestCode::UpdateFlow => "update_flow",
            RequestCode::Achievements => "achievements",
            RequestCode::Leaderboard => "leaderboard",
            RequestCode::SignIn => "sign_in",
            RequestCode::VideoCapture => "video_capture",
        }
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#05x})", self.label(), self.code())
    }
}
