//! Scripted in-process vendor simulator
//!
//! Implements all three vendor seams from a declarative script so the core
//! can be exercised without a device: by unit tests, by the headless
//! scenario runner, and by host developers rehearsing their event handling.
//!
//! Every vendor call is appended to a call log, which tests inspect to prove
//! that gated commands never reach the vendor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use playbridge_core::prelude::*;

use crate::host::{ActivityPayload, HostActivity, Intent, Resolution};
use crate::identity::{
    Account, ClientHandle, ClientKind, GameClients, IdentityPlatform, LeaderboardScore, Player,
    SignInFailure, SignInOutcome,
};
use crate::updates::{
    AppUpdateInfo, InstallListener, InstallState, ListenerId, UpdateOptions, UpdatePlatform,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────

/// Declarative behavior of the simulated identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityScript {
    #[serde(default = "default_true")]
    pub available: bool,

    /// Account the vendor remembers from a previous run
    #[serde(default)]
    pub cached_account: Option<String>,

    /// Account silent sign-in resolves to; `None` makes it fail
    #[serde(default)]
    pub silent_account: Option<String>,

    /// Player returned by the profile fetch; derived from the account when absent
    #[serde(default)]
    pub player: Option<Player>,

    #[serde(default)]
    pub player_fetch_fails: bool,

    #[serde(default)]
    pub sign_out_fails: bool,

    /// Whether the device can capture gameplay
    #[serde(default = "default_true")]
    pub video_capture: bool,

    /// Top scores per leaderboard id; unknown ids fail to load
    #[serde(default)]
    pub leaderboards: HashMap<String, Vec<LeaderboardScore>>,

    /// Current player's entry per leaderboard id
    #[serde(default)]
    pub player_scores: HashMap<String, LeaderboardScore>,

    /// Intent kinds that fail to build: `achievements`, `leaderboard`,
    /// `all_leaderboards`, `capture`
    #[serde(default)]
    pub failing_intents: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for IdentityScript {
    fn default() -> Self {
        Self {
            available: true,
            cached_account: None,
            silent_account: None,
            player: None,
            player_fetch_fails: false,
            sign_out_fails: false,
            video_capture: true,
            leaderboards: HashMap::new(),
            player_scores: HashMap::new(),
            failing_intents: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct IdentityRuntime {
    signed_in: Option<Account>,
    calls: Vec<String>,
}

/// Simulated identity service
#[derive(Debug)]
pub struct SimIdentity {
    script: IdentityScript,
    runtime: Mutex<IdentityRuntime>,
}

impl SimIdentity {
    pub fn new(script: IdentityScript) -> Self {
        let signed_in = script.cached_account.clone().map(Account::new);
        Self {
            script,
            runtime: Mutex::new(IdentityRuntime {
                signed_in,
                calls: Vec::new(),
            }),
        }
    }

    /// Every vendor call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.runtime).calls.clone()
    }

    /// Number of calls whose name starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.runtime)
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Drop the cached account as if the user signed out outside the app
    pub fn forget_account(&self) {
        lock(&self.runtime).signed_in = None;
    }

    /// Payload a host would deliver after a successful interactive sign-in
    pub fn success_payload(account: &str) -> ActivityPayload {
        ActivityPayload(serde_json::json!({ "account": account }))
    }

    /// Payload a host would deliver after a failed interactive sign-in
    pub fn failure_payload(status_code: i32, resolution: Option<&str>) -> ActivityPayload {
        let failure = SignInFailure {
            status_code,
            message: Some("sign-in required".to_string()),
            resolution: resolution.map(|token| Resolution {
                token: token.to_string(),
            }),
        };
        ActivityPayload(serde_json::json!({ "failure": failure }))
    }

    fn record(&self, call: impl Into<String>) {
        lock(&self.runtime).calls.push(call.into());
    }

    fn intent(&self, kind: &str, action: String) -> Result<Intent> {
        if self.script.failing_intents.iter().any(|k| k == kind) {
            return Err(Error::vendor(
                format!("{kind}_intent"),
                "intent unavailable",
            ));
        }
        Ok(Intent::new(action))
    }

    fn player_for(&self, account_id: &str) -> Player {
        self.script.player.clone().unwrap_or_else(|| Player {
            name: account_id.to_string(),
            title: String::new(),
            player_id: format!("player-{account_id}"),
            display_name: account_id.to_string(),
            icon_image_uri: None,
        })
    }
}

impl IdentityPlatform for SimIdentity {
    fn is_available(&self) -> bool {
        self.script.available
    }

    fn last_signed_in_account(&self) -> Option<Account> {
        lock(&self.runtime).signed_in.clone()
    }

    fn sign_in_intent(&self) -> Intent {
        self.record("sign_in_intent");
        Intent::new("games.SIGN_IN")
    }

    fn sign_in_result(&self, payload: &ActivityPayload) -> Option<SignInOutcome> {
        self.record("sign_in_result");
        if let Some(id) = payload.0.get("account").and_then(|a| a.as_str()) {
            let account = Account::new(id);
            lock(&self.runtime).signed_in = Some(account.clone());
            return Some(Ok(account));
        }

        let failure = payload.0.get("failure")?;
        match serde_json::from_value::<SignInFailure>(failure.clone()) {
            Ok(failure) => Some(Err(failure)),
            Err(e) => {
                warn!("Simulated sign-in payload is malformed: {}", e);
                None
            }
        }
    }

    fn acquire_clients(&self, account: &Account) -> GameClients {
        self.record(format!("acquire_clients:{}", account.id));
        GameClients {
            achievements: ClientHandle::new(ClientKind::Achievements, account),
            leaderboards: ClientHandle::new(ClientKind::Leaderboards, account),
            players: ClientHandle::new(ClientKind::Players, account),
            videos: self
                .script
                .video_capture
                .then(|| ClientHandle::new(ClientKind::Videos, account)),
        }
    }

    async fn silent_sign_in(&self) -> Result<Account> {
        self.record("silent_sign_in");
        match &self.script.silent_account {
            Some(id) => {
                let account = Account::new(id.clone());
                lock(&self.runtime).signed_in = Some(account.clone());
                Ok(account)
            }
            None => Err(Error::vendor("silent_sign_in", "sign-in required")),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.record("sign_out");
        if self.script.sign_out_fails {
            return Err(Error::vendor("sign_out", "service disconnected"));
        }
        lock(&self.runtime).signed_in = None;
        Ok(())
    }

    async fn current_player(&self, players: &ClientHandle) -> Result<Player> {
        self.record("current_player");
        if self.script.player_fetch_fails {
            return Err(Error::vendor("current_player", "player unavailable"));
        }
        Ok(self.player_for(&players.account_id))
    }

    async fn increment_achievement(
        &self,
        _achievements: &ClientHandle,
        achievement: &str,
        steps: u32,
    ) -> Result<()> {
        self.record(format!("increment_achievement:{achievement}:{steps}"));
        Ok(())
    }

    async fn unlock_achievement(&self, _achievements: &ClientHandle, achievement: &str) -> Result<()> {
        self.record(format!("unlock_achievement:{achievement}"));
        Ok(())
    }

    async fn submit_score(
        &self,
        _leaderboards: &ClientHandle,
        leaderboard: &str,
        score: i64,
    ) -> Result<()> {
        self.record(format!("submit_score:{leaderboard}:{score}"));
        Ok(())
    }

    async fn load_top_scores(
        &self,
        _leaderboards: &ClientHandle,
        leaderboard: &str,
        max: u32,
    ) -> Result<Vec<LeaderboardScore>> {
        self.record(format!("load_top_scores:{leaderboard}"));
        let scores = self
            .script
            .leaderboards
            .get(leaderboard)
            .ok_or_else(|| Error::vendor("load_top_scores", format!("unknown leaderboard {leaderboard}")))?;
        Ok(scores.iter().take(max as usize).cloned().collect())
    }

    async fn load_current_player_score(
        &self,
        _leaderboards: &ClientHandle,
        leaderboard: &str,
    ) -> Result<Option<LeaderboardScore>> {
        self.record(format!("load_current_player_score:{leaderboard}"));
        if !self.script.leaderboards.contains_key(leaderboard)
            && !self.script.player_scores.contains_key(leaderboard)
        {
            return Err(Error::vendor(
                "load_current_player_score",
                format!("unknown leaderboard {leaderboard}"),
            ));
        }
        Ok(self.script.player_scores.get(leaderboard).cloned())
    }

    async fn achievements_intent(&self, _achievements: &ClientHandle) -> Result<Intent> {
        self.record("achievements_intent");
        self.intent("achievements", "games.SHOW_ACHIEVEMENTS".to_string())
    }

    async fn leaderboard_intent(&self, _leaderboards: &ClientHandle, leaderboard: &str) -> Result<Intent> {
        self.record(format!("leaderboard_intent:{leaderboard}"));
        self.intent("leaderboard", format!("games.SHOW_LEADERBOARD:{leaderboard}"))
    }

    async fn all_leaderboards_intent(&self, _leaderboards: &ClientHandle) -> Result<Intent> {
        self.record("all_leaderboards_intent");
        self.intent("all_leaderboards", "games.SHOW_ALL_LEADERBOARDS".to_string())
    }

    async fn capture_overlay_intent(&self, _videos: &ClientHandle) -> Result<Intent> {
        self.record("capture_overlay_intent");
        self.intent("capture", "games.CAPTURE_OVERLAY".to_string())
    }
}

// ─────────────────────────────────────────────────────────
// Updates
// ─────────────────────────────────────────────────────────

/// Declarative behavior of the simulated update service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScript {
    /// Answer to update-info queries; `None` makes the query fail
    #[serde(default)]
    pub info: Option<AppUpdateInfo>,

    #[serde(default)]
    pub flow_fails: bool,
}

/// A recorded update-flow launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLaunch {
    pub options: UpdateOptions,
    pub request_code: i32,
}

#[derive(Default)]
struct UpdateRuntime {
    info: Option<AppUpdateInfo>,
    listeners: HashMap<ListenerId, Arc<InstallListener>>,
    next_listener: u64,
    launches: Vec<FlowLaunch>,
    completed: usize,
    queries: usize,
}

/// Simulated update service
pub struct SimUpdates {
    flow_fails: bool,
    runtime: Mutex<UpdateRuntime>,
}

impl std::fmt::Debug for SimUpdates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimUpdates")
            .field("flow_fails", &self.flow_fails)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SimUpdates {
    pub fn new(script: UpdateScript) -> Self {
        Self {
            flow_fails: script.flow_fails,
            runtime: Mutex::new(UpdateRuntime {
                info: script.info,
                ..Default::default()
            }),
        }
    }

    /// Replace what subsequent queries return
    pub fn set_info(&self, info: Option<AppUpdateInfo>) {
        lock(&self.runtime).info = info;
    }

    /// Push an install-state change to every registered listener
    pub fn push_install_state(&self, state: InstallState) {
        let listeners: Vec<Arc<InstallListener>> =
            lock(&self.runtime).listeners.values().cloned().collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.runtime).listeners.len()
    }

    pub fn launches(&self) -> Vec<FlowLaunch> {
        lock(&self.runtime).launches.clone()
    }

    pub fn completed_updates(&self) -> usize {
        lock(&self.runtime).completed
    }

    pub fn query_count(&self) -> usize {
        lock(&self.runtime).queries
    }
}

impl UpdatePlatform for SimUpdates {
    async fn app_update_info(&self) -> Result<AppUpdateInfo> {
        let mut runtime = lock(&self.runtime);
        runtime.queries += 1;
        runtime
            .info
            .clone()
            .ok_or_else(|| Error::vendor("app_update_info", "update service unreachable"))
    }

    fn start_update_flow(
        &self,
        _info: &AppUpdateInfo,
        options: UpdateOptions,
        request_code: i32,
    ) -> Result<()> {
        if self.flow_fails {
            return Err(Error::launch(request_code, "update flow rejected"));
        }
        lock(&self.runtime).launches.push(FlowLaunch {
            options,
            request_code,
        });
        Ok(())
    }

    fn register_listener(&self, listener: InstallListener) -> ListenerId {
        let mut runtime = lock(&self.runtime);
        runtime.next_listener += 1;
        let id = ListenerId(runtime.next_listener);
        runtime.listeners.insert(id, Arc::new(listener));
        id
    }

    fn unregister_listener(&self, id: ListenerId) {
        lock(&self.runtime).listeners.remove(&id);
    }

    async fn complete_update(&self) -> Result<()> {
        lock(&self.runtime).completed += 1;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// Host
// ─────────────────────────────────────────────────────────

/// A recorded foreground launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLaunch {
    Intent { action: String, request_code: i32 },
    Resolution { token: String, request_code: i32 },
}

impl HostLaunch {
    pub fn request_code(&self) -> i32 {
        match self {
            HostLaunch::Intent { request_code, .. } | HostLaunch::Resolution { request_code, .. } => {
                *request_code
            }
        }
    }
}

#[derive(Debug, Default)]
struct HostRuntime {
    launches: Vec<HostLaunch>,
    failures_pending: usize,
}

/// Simulated host foreground context
#[derive(Debug, Default)]
pub struct SimHost {
    runtime: Mutex<HostRuntime>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` launches fail
    pub fn fail_next_launches(&self, count: usize) {
        lock(&self.runtime).failures_pending = count;
    }

    pub fn launches(&self) -> Vec<HostLaunch> {
        lock(&self.runtime).launches.clone()
    }

    fn accept(&self, launch: HostLaunch) -> Result<()> {
        let mut runtime = lock(&self.runtime);
        if runtime.failures_pending > 0 {
            runtime.failures_pending -= 1;
            return Err(Error::launch(launch.request_code(), "no activity to handle intent"));
        }
        runtime.launches.push(launch);
        Ok(())
    }
}

impl HostActivity for SimHost {
    fn launch_intent(&self, intent: &Intent, request_code: i32) -> Result<()> {
        self.accept(HostLaunch::Intent {
            action: intent.action.clone(),
            request_code,
        })
    }

    fn launch_resolution(&self, resolution: &Resolution, request_code: i32) -> Result<()> {
        self.accept(HostLaunch::Resolution {
            token: resolution.token.clone(),
            request_code,
        })
    }
}
