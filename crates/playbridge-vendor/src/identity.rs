//! Identity service seam: sign-in and the per-account game clients

use serde::{Deserialize, Serialize};

use playbridge_core::prelude::*;
use playbridge_core::{PlayerProfile, ScoreRecord};

use crate::host::{ActivityPayload, Intent, Resolution};

/// A resolved platform account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Kind of a derived game client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Achievements,
    Leaderboards,
    Players,
    Videos,
}

/// Handle to one derived game client, bound to the account it was built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHandle {
    pub kind: ClientKind,
    pub account_id: String,
}

impl ClientHandle {
    pub fn new(kind: ClientKind, account: &Account) -> Self {
        Self {
            kind,
            account_id: account.id.clone(),
        }
    }
}

/// The client set acquired on every successful sign-in.
///
/// Never reused across sign-in cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClients {
    pub achievements: ClientHandle,
    pub leaderboards: ClientHandle,
    pub players: ClientHandle,
    /// Absent when the device cannot capture gameplay
    pub videos: Option<ClientHandle>,
}

/// Player details as returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub player_id: String,
    pub display_name: String,
    #[serde(default)]
    pub icon_image_uri: Option<String>,
}

impl From<Player> for PlayerProfile {
    fn from(player: Player) -> Self {
        PlayerProfile {
            name: player.name,
            title: player.title,
            player_id: player.player_id,
            display_name: player.display_name,
            icon_uri: player.icon_image_uri,
        }
    }
}

/// A leaderboard entry as returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardScore {
    pub rank: i64,
    pub display_rank: String,
    pub display_score: String,
    pub raw_score: i64,
    #[serde(default)]
    pub score_tag: Option<String>,
    #[serde(default)]
    pub timestamp_millis: i64,
}

impl LeaderboardScore {
    /// Convert into the host record, tagged with the leaderboard it came from
    pub fn to_record(&self, leaderboard: &str) -> ScoreRecord {
        ScoreRecord {
            name: leaderboard.to_string(),
            rank: self.rank,
            display_rank: self.display_rank.clone(),
            display_score: self.display_score.clone(),
            raw_score: self.raw_score,
            tag: self.score_tag.clone(),
            timestamp_millis: self.timestamp_millis,
        }
    }
}

/// Failed interactive sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInFailure {
    pub status_code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

impl SignInFailure {
    pub fn has_resolution(&self) -> bool {
        self.resolution.is_some()
    }
}

/// Outcome parsed from an interactive sign-in activity result
pub type SignInOutcome = std::result::Result<Account, SignInFailure>;

/// Identity service operations.
///
/// Sync methods read vendor-cached state; async methods are the vendor's
/// background operations and may complete on any thread.
#[trait_variant::make(IdentityPlatform: Send)]
pub trait LocalIdentityPlatform {
    /// Whether the identity service exists on this device
    fn is_available(&self) -> bool;

    /// Account cached by the vendor from a previous sign-in
    fn last_signed_in_account(&self) -> Option<Account>;

    /// Intent for the interactive sign-in UI
    fn sign_in_intent(&self) -> Intent;

    /// Parse the data delivered with a sign-in activity result
    fn sign_in_result(&self, payload: &ActivityPayload) -> Option<SignInOutcome>;

    /// Build the derived clients for `account`
    fn acquire_clients(&self, account: &Account) -> GameClients;

    async fn silent_sign_in(&self) -> Result<Account>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_player(&self, players: &ClientHandle) -> Result<Player>;

    async fn increment_achievement(
        &self,
        achievements: &ClientHandle,
        achievement: &str,
        steps: u32,
    ) -> Result<()>;

    async fn unlock_achievement(&self, achievements: &ClientHandle, achievement: &str)
        -> Result<()>;

    async fn submit_score(
        &self,
        leaderboards: &ClientHandle,
        leaderboard: &str,
        score: i64,
    ) -> Result<()>;

    async fn load_top_scores(
        &self,
        leaderboards: &ClientHandle,
        leaderboard: &str,
        max: u32,
    ) -> Result<Vec<LeaderboardScore>>;

    async fn load_current_player_score(
        &self,
        leaderboards: &ClientHandle,
        leaderboard: &str,
    ) -> Result<Option<LeaderboardScore>>;

    async fn achievements_intent(&self, achievements: &ClientHandle) -> Result<Intent>;

    async fn leaderboard_intent(&self, leaderboards: &ClientHandle, leaderboard: &str)
        -> Result<Intent>;

    async fn all_leaderboards_intent(&self, leaderboards: &ClientHandle) -> Result<Intent>;

    async fn capture_overlay_intent(&self, videos: &ClientHandle) -> Result<Intent>;
}
