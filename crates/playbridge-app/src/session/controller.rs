use std::sync::Arc;

use playbridge_core::prelude::*;
use playbridge_core::{BridgeEvent, OperationFailure, PlayerProfile};
use playbridge_vendor::{
    Account, ActivityPayload, GameClients, IdentityPlatform, Intent, LeaderboardScore, Player,
    SignInFailure,
};

use crate::handler::{LaunchTarget, Task, UpdateAction, UpdateResult};
use crate::message::Completion;
use crate::router::{Continuation, Surface};

use super::state::{SessionPhase, SessionState};

/// Owns the authoritative sign-in state and the clients derived from it.
///
/// Every method runs on the engine's serialized context and returns the
/// work it wants done instead of doing it.
pub struct SessionController<I> {
    identity: Arc<I>,
    state: SessionState,
    clients: Option<GameClients>,
    profile: Option<PlayerProfile>,
    report_failures: bool,
}

impl<I> std::fmt::Debug for SessionController<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("clients", &self.clients)
            .field("profile", &self.profile)
            .finish()
    }
}

impl<I: IdentityPlatform> SessionController<I> {
    pub fn new(identity: Arc<I>, report_failures: bool) -> Self {
        Self {
            identity,
            state: SessionState::default(),
            clients: None,
            profile: None,
            report_failures,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn clients(&self) -> Option<&GameClients> {
        self.clients.as_ref()
    }

    // ─────────────────────────────────────────────────────────
    // Pure reads
    // ─────────────────────────────────────────────────────────

    pub fn is_available(&self) -> bool {
        self.identity.is_available()
    }

    /// Whether the vendor holds a signed-in account that this session has adopted
    pub fn is_connected(&self) -> bool {
        self.state.connected() && self.identity.last_signed_in_account().is_some()
    }

    pub fn can_record(&self) -> bool {
        self.state.connected()
            && self
                .clients
                .as_ref()
                .is_some_and(|clients| clients.videos.is_some())
    }

    /// The current profile, or the empty profile unless connected
    pub fn player_info(&self) -> PlayerProfile {
        if !self.state.connected() {
            return PlayerProfile::default();
        }
        self.profile.clone().unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────
    // Sign-in lifecycle
    // ─────────────────────────────────────────────────────────

    pub fn initialize(&mut self) -> UpdateResult {
        if self.state.phase != SessionPhase::Uninitialized {
            debug!("Session already initialized ({:?})", self.state.phase);
            return UpdateResult::none();
        }

        if !self.identity.is_available() {
            warn!("Identity service unavailable on this device; session commands disabled");
            self.state.phase = SessionPhase::Unavailable;
            return UpdateResult::none();
        }

        if let Some(account) = self.identity.last_signed_in_account() {
            info!("Found cached account, resuming session");
            return self.complete_sign_in(account);
        }

        info!("No cached account, attempting silent sign-in");
        self.state.phase = SessionPhase::SilentAttempting;
        self.state.silent_attempted = true;
        UpdateResult::task(Task::SilentSignIn {
            epoch: self.state.epoch,
        })
    }

    /// Start the interactive sign-in flow
    pub fn sign_in(&mut self) -> UpdateResult {
        match self.state.phase {
            SessionPhase::Uninitialized | SessionPhase::Unavailable => {
                debug!("sign_in ignored: session not initialized");
                return UpdateResult::none();
            }
            SessionPhase::Connected => {
                debug!("sign_in ignored: already connected");
                return UpdateResult::none();
            }
            SessionPhase::Disconnected | SessionPhase::SilentAttempting => {}
        }

        if let Some(account) = self.identity.last_signed_in_account() {
            debug!("sign_in found a cached account, adopting it");
            return self.complete_sign_in(account);
        }

        if self.state.intent_in_progress {
            debug!("sign_in ignored: a sign-in flow is already on screen");
            return UpdateResult::none();
        }

        // An explicit request from the host opens a new failure episode
        self.state.resolving_failure = false;
        self.launch_sign_in_intent()
    }

    fn launch_sign_in_intent(&mut self) -> UpdateResult {
        self.state.intent_in_progress = true;
        UpdateResult::launch(
            LaunchTarget::Intent(self.identity.sign_in_intent()),
            Continuation::InteractiveSignIn,
        )
    }

    pub fn on_silent_sign_in(&mut self, epoch: u64, result: Completion<Account>) -> UpdateResult {
        if !self.state.is_current(epoch) {
            debug!("Discarding stale silent sign-in completion (epoch {})", epoch);
            return UpdateResult::none();
        }

        match result {
            Ok(account) => self.complete_sign_in(account),
            Err(reason) => {
                info!("Silent sign-in failed: {}", reason);
                if self.state.phase == SessionPhase::SilentAttempting {
                    self.state.phase = SessionPhase::Disconnected;
                }
                UpdateResult::none()
            }
        }
    }

    /// Resume after the sign-in (or resolution) flow reported back
    pub fn on_sign_in_result(
        &mut self,
        result_code: i32,
        payload: Option<&ActivityPayload>,
    ) -> UpdateResult {
        self.state.intent_in_progress = false;

        let outcome = payload.and_then(|payload| self.identity.sign_in_result(payload));
        match outcome {
            Some(Ok(account)) => self.complete_sign_in(account),
            Some(Err(failure)) => self.on_sign_in_failure(failure),
            None => {
                info!("Sign-in flow closed without an outcome (result {})", result_code);
                UpdateResult::none()
            }
        }
    }

    fn on_sign_in_failure(&mut self, failure: SignInFailure) -> UpdateResult {
        if self.state.connected() {
            debug!(
                "Sign-in flow failed (status {}) after the session connected; ignoring",
                failure.status_code
            );
            return UpdateResult::none();
        }

        if self.state.resolving_failure {
            warn!(
                "Sign-in failed again during resolution (status {}); giving up until the next sign_in",
                failure.status_code
            );
            return UpdateResult::none();
        }

        match failure.resolution {
            Some(resolution) if !self.state.intent_in_progress => {
                info!(
                    "Sign-in failed with status {}, launching resolution",
                    failure.status_code
                );
                self.state.resolving_failure = true;
                self.state.intent_in_progress = true;
                UpdateResult::launch(
                    LaunchTarget::Resolution(resolution),
                    Continuation::SignInResolution,
                )
            }
            _ => {
                warn!(
                    "Sign-in failed with status {}: {}",
                    failure.status_code,
                    failure.message.as_deref().unwrap_or("no message")
                );
                UpdateResult::none()
            }
        }
    }

    /// A flow this controller asked for could not be launched
    pub fn on_launch_failed(&mut self, continuation: Continuation, reason: &str) -> UpdateResult {
        match continuation {
            Continuation::SignInResolution => {
                // One bounded retry: fall back to the plain sign-in flow.
                // resolving_failure stays set so a further failure is dropped.
                warn!("Resolution launch failed ({}), retrying sign-in once", reason);
                self.state.intent_in_progress = false;
                if self.state.connected() {
                    return UpdateResult::none();
                }
                self.launch_sign_in_intent()
            }
            Continuation::InteractiveSignIn => {
                warn!("Sign-in flow launch failed: {}", reason);
                self.state.intent_in_progress = false;
                UpdateResult::none()
            }
            Continuation::Presentation(surface) => {
                warn!("{} launch failed: {}", surface.operation(), reason);
                self.failure(surface.operation(), reason)
            }
            Continuation::VideoCapture => {
                warn!("Capture overlay launch failed: {}", reason);
                self.failure("record", reason)
            }
            Continuation::UpdateFlow { .. } => {
                warn!("Update flow launch failure routed to session controller; ignoring");
                UpdateResult::none()
            }
        }
    }

    /// Adopt a resolved account. Emits `signed_in` at most once per cycle.
    fn complete_sign_in(&mut self, account: Account) -> UpdateResult {
        if self.state.connected() {
            debug!("Already connected; ignoring duplicate sign-in for {}", account.id);
            return UpdateResult::none();
        }

        let clients = self.identity.acquire_clients(&account);
        let players = clients.players.clone();

        self.state.epoch += 1;
        self.state.phase = SessionPhase::Connected;
        self.state.intent_in_progress = false;
        self.state.resolving_failure = false;
        self.clients = Some(clients);
        self.profile = None;

        info!("Signed in as {}", account.id);
        UpdateResult::event(BridgeEvent::SignedIn).with_action(UpdateAction::SpawnTask(
            Task::FetchPlayer {
                epoch: self.state.epoch,
                players,
            },
        ))
    }

    pub fn on_player_loaded(&mut self, epoch: u64, result: Completion<Player>) -> UpdateResult {
        if !self.is_live(epoch) {
            debug!("Discarding stale player profile");
            return UpdateResult::none();
        }

        match result {
            Ok(player) => {
                let profile = PlayerProfile::from(player);
                self.profile = Some(profile.clone());
                UpdateResult::event(BridgeEvent::ProfileUpdated(profile))
            }
            Err(reason) => {
                warn!("Player profile fetch failed: {}", reason);
                self.failure("get_player_info", &reason)
            }
        }
    }

    pub fn sign_out(&mut self) -> UpdateResult {
        if !self.state.phase.is_initialized() {
            debug!("sign_out ignored: no identity client");
            return UpdateResult::none();
        }
        UpdateResult::task(Task::SignOut)
    }

    /// Local state is cleared whatever the vendor reports
    pub fn on_sign_out_completed(&mut self, result: Completion<()>) -> UpdateResult {
        if let Err(reason) = &result {
            warn!("Vendor sign-out failed: {}; clearing local session anyway", reason);
        }

        if !self.state.phase.is_initialized() {
            return UpdateResult::none();
        }

        let was_connected = self.state.connected();
        self.clients = None;
        self.profile = None;
        self.state.reset(SessionPhase::Disconnected);

        if was_connected {
            info!("Signed out");
            UpdateResult::event(BridgeEvent::SignedOut)
        } else {
            debug!("sign_out completed while already signed out");
            UpdateResult::none()
        }
    }

    /// Drop everything. The next session starts from `initialize`.
    pub fn teardown(&mut self) {
        self.clients = None;
        self.profile = None;
        self.state.reset(SessionPhase::Uninitialized);
    }

    // ─────────────────────────────────────────────────────────
    // Connected-gated commands
    // ─────────────────────────────────────────────────────────

    fn connected_clients(&self, op: &str) -> Option<&GameClients> {
        if !self.state.connected() {
            debug!("{} ignored: not connected", op);
            return None;
        }
        self.clients.as_ref()
    }

    pub fn increase_achievement(&mut self, achievement: String, steps: u32) -> UpdateResult {
        let Some(clients) = self.connected_clients("increase_achievement") else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::IncrementAchievement {
            achievements: clients.achievements.clone(),
            achievement,
            steps,
        })
    }

    pub fn unlock_achievement(&mut self, achievement: String) -> UpdateResult {
        let Some(clients) = self.connected_clients("unlock_achievement") else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::UnlockAchievement {
            achievements: clients.achievements.clone(),
            achievement,
        })
    }

    pub fn submit_score(&mut self, leaderboard: String, score: i64) -> UpdateResult {
        let Some(clients) = self.connected_clients("submit_score") else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::SubmitScore {
            leaderboards: clients.leaderboards.clone(),
            leaderboard,
            score,
        })
    }

    pub fn load_top_scores(&mut self, leaderboard: String, max: u32) -> UpdateResult {
        let Some(clients) = self.connected_clients("load_top_scores") else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::LoadTopScores {
            epoch: self.state.epoch,
            leaderboards: clients.leaderboards.clone(),
            leaderboard,
            max,
        })
    }

    pub fn load_player_score(&mut self, leaderboard: String) -> UpdateResult {
        let Some(clients) = self.connected_clients("load_current_player_score") else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::LoadPlayerScore {
            epoch: self.state.epoch,
            leaderboards: clients.leaderboards.clone(),
            leaderboard,
        })
    }

    /// Request the presentation intent for a surface; launched when it arrives
    pub fn show(&mut self, surface: Surface) -> UpdateResult {
        let Some(clients) = self.connected_clients(surface.operation()) else {
            return UpdateResult::none();
        };
        let client = match surface {
            Surface::Achievements => clients.achievements.clone(),
            Surface::Leaderboard(_) | Surface::AllLeaderboards => clients.leaderboards.clone(),
        };
        UpdateResult::task(Task::FetchPresentationIntent {
            epoch: self.state.epoch,
            client,
            surface,
        })
    }

    pub fn record(&mut self) -> UpdateResult {
        if !self.can_record() {
            debug!("record ignored: not connected or capture unsupported");
            return UpdateResult::none();
        }
        let Some(videos) = self.clients.as_ref().and_then(|c| c.videos.clone()) else {
            return UpdateResult::none();
        };
        UpdateResult::task(Task::FetchCaptureIntent {
            epoch: self.state.epoch,
            videos,
        })
    }

    // ─────────────────────────────────────────────────────────
    // Best-effort completions
    // ─────────────────────────────────────────────────────────

    pub fn on_top_scores(
        &mut self,
        epoch: u64,
        leaderboard: &str,
        result: Completion<Vec<LeaderboardScore>>,
    ) -> UpdateResult {
        if !self.is_live(epoch) {
            debug!("Discarding stale top scores for {}", leaderboard);
            return UpdateResult::none();
        }

        match result {
            Ok(scores) => {
                let records = scores.iter().map(|s| s.to_record(leaderboard)).collect();
                UpdateResult::event(BridgeEvent::ScoresLoaded(records))
            }
            Err(reason) => {
                warn!("Loading top scores for {} failed: {}", leaderboard, reason);
                self.failure("load_top_scores", &reason)
            }
        }
    }

    pub fn on_player_score(
        &mut self,
        epoch: u64,
        leaderboard: &str,
        result: Completion<Option<LeaderboardScore>>,
    ) -> UpdateResult {
        if !self.is_live(epoch) {
            debug!("Discarding stale player score for {}", leaderboard);
            return UpdateResult::none();
        }

        match result {
            Ok(Some(score)) => {
                UpdateResult::event(BridgeEvent::ScoreLoaded(score.to_record(leaderboard)))
            }
            Ok(None) => {
                debug!("Player has no score on {}", leaderboard);
                UpdateResult::none()
            }
            Err(reason) => {
                warn!("Loading player score for {} failed: {}", leaderboard, reason);
                self.failure("load_current_player_score", &reason)
            }
        }
    }

    pub fn on_presentation_intent(
        &mut self,
        epoch: u64,
        surface: Surface,
        result: Completion<Intent>,
    ) -> UpdateResult {
        if !self.is_live(epoch) {
            debug!("Discarding stale {} intent", surface.operation());
            return UpdateResult::none();
        }

        match result {
            Ok(intent) => {
                UpdateResult::launch(LaunchTarget::Intent(intent), Continuation::Presentation(surface))
            }
            Err(reason) => {
                warn!("{} intent unavailable: {}", surface.operation(), reason);
                self.failure(surface.operation(), &reason)
            }
        }
    }

    /// `recording_started` fires before the capture overlay is launched
    pub fn on_capture_intent(&mut self, epoch: u64, result: Completion<Intent>) -> UpdateResult {
        if !self.is_live(epoch) {
            debug!("Discarding stale capture intent");
            return UpdateResult::none();
        }

        match result {
            Ok(intent) => {
                UpdateResult::launch(LaunchTarget::Intent(intent), Continuation::VideoCapture)
                    .with_event(BridgeEvent::RecordingStarted)
            }
            Err(reason) => {
                warn!("Capture overlay intent unavailable: {}", reason);
                self.failure("record", &reason)
            }
        }
    }

    fn is_live(&self, epoch: u64) -> bool {
        self.state.connected() && self.state.is_current(epoch)
    }

    fn failure(&self, op: &str, reason: &str) -> UpdateResult {
        if !self.report_failures {
            return UpdateResult::none();
        }
        UpdateResult::event(BridgeEvent::OperationFailed(OperationFailure::new(op, reason)))
    }
}
