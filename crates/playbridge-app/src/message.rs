//! Message types for the bridge (TEA pattern)

use playbridge_core::UpdateMode;
use playbridge_vendor::{
    Account, ActivityPayload, AppUpdateInfo, InstallState, Intent, LeaderboardScore, ListenerId,
    Player,
};

use crate::app_update::UpdateQuery;
use crate::config::CheckConfig;
use crate::router::{Continuation, Surface};

/// Outcome of a vendor operation as carried back to the engine. Failures
/// travel as their display text so messages stay `Clone`.
pub type Completion<T> = std::result::Result<T, String>;

/// Host commands. Each maps to one host-visible method on the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ─────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────
    Initialize,
    SignIn,
    SignOut,

    IncreaseAchievement { achievement: String, steps: u32 },
    UnlockAchievement { achievement: String },
    SubmitScore { leaderboard: String, score: i64 },
    LoadTopScores { leaderboard: String, max: u32 },
    LoadPlayerScore { leaderboard: String },

    ShowAchievements,
    ShowLeaderboard { leaderboard: String },
    ShowAllLeaderboards,
    Record,

    // ─────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────
    StartCheck(CheckConfig),
    StartUpdate {
        mode: UpdateMode,
        allow_asset_pack_deletion: bool,
    },
    CompleteUpdate,

    // ─────────────────────────────────────────────────────────
    // Host lifecycle
    // ─────────────────────────────────────────────────────────
    /// Host foreground context resumed
    Resume,
    /// Host foreground context destroyed
    Teardown,
}

/// All messages processed on the serialized context
#[derive(Debug, Clone)]
pub enum Message {
    /// Command issued by the host
    Command(Command),

    /// Result delivered through the host's activity-result funnel
    ActivityResult {
        request_code: i32,
        result_code: i32,
        payload: Option<ActivityPayload>,
    },

    /// A foreground launch was rejected by the host or vendor
    LaunchFailed {
        continuation: Continuation,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────
    // Identity completions
    // ─────────────────────────────────────────────────────────
    SilentSignInCompleted {
        epoch: u64,
        result: Completion<Account>,
    },

    SignOutCompleted {
        result: Completion<()>,
    },

    PlayerLoaded {
        epoch: u64,
        result: Completion<Player>,
    },

    TopScoresLoaded {
        epoch: u64,
        leaderboard: String,
        result: Completion<Vec<LeaderboardScore>>,
    },

    PlayerScoreLoaded {
        epoch: u64,
        leaderboard: String,
        result: Completion<Option<LeaderboardScore>>,
    },

    PresentationIntentReady {
        epoch: u64,
        surface: Surface,
        result: Completion<Intent>,
    },

    CaptureIntentReady {
        epoch: u64,
        result: Completion<Intent>,
    },

    // ─────────────────────────────────────────────────────────
    // Update completions
    // ─────────────────────────────────────────────────────────
    UpdateInfoLoaded {
        query: UpdateQuery,
        result: Completion<AppUpdateInfo>,
    },

    /// Pushed by the vendor install-state listener
    InstallStateChanged(InstallState),

    InstallListenerRegistered(ListenerId),
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}
