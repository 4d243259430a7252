//! Handler module - TEA update function
//!
//! [`update`] is the only place controller state changes. It routes each
//! [`Message`] to the owning controller and returns an [`UpdateResult`]:
//! at most one event for the host, plus actions for the engine to perform.


use playbridge_core::prelude::*;
use playbridge_core::BridgeEvent;
use playbridge_vendor::{
    ActivityPayload, AppUpdateInfo, ClientHandle, IdentityPlatform, Intent, ListenerId,
    Resolution, UpdateOptions,
};

use crate::app_update::UpdateQuery;
use crate::message::{Command, Message};
use crate::router::{Continuation, Surface};
use crate::state::BridgeState;

/// Actions that the engine should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Spawn a vendor operation; its completion comes back as a message
    SpawnTask(Task),

    /// Register the continuation, then launch the foreground flow under its code
    Launch(LaunchRequest),

    /// Subscribe to install-state changes
    RegisterInstallListener,

    UnregisterInstallListener(ListenerId),
}

/// A foreground flow to launch
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub target: LaunchTarget,
    pub continuation: Continuation,
}

/// What the host (or vendor) is asked to present
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchTarget {
    Intent(Intent),
    Resolution(Resolution),
    UpdateFlow {
        info: AppUpdateInfo,
        options: UpdateOptions,
    },
}

/// Vendor operations run off the serialized context
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    SilentSignIn {
        epoch: u64,
    },
    SignOut,
    FetchPlayer {
        epoch: u64,
        players: ClientHandle,
    },

    // Fire-and-forget writes: failures are logged, nothing is posted back
    IncrementAchievement {
        achievements: ClientHandle,
        achievement: String,
        steps: u32,
    },
    UnlockAchievement {
        achievements: ClientHandle,
        achievement: String,
    },
    SubmitScore {
        leaderboards: ClientHandle,
        leaderboard: String,
        score: i64,
    },

    LoadTopScores {
        epoch: u64,
        leaderboards: ClientHandle,
        leaderboard: String,
        max: u32,
    },
    LoadPlayerScore {
        epoch: u64,
        leaderboards: ClientHandle,
        leaderboard: String,
    },
    FetchPresentationIntent {
        epoch: u64,
        client: ClientHandle,
        surface: Surface,
    },
    FetchCaptureIntent {
        epoch: u64,
        videos: ClientHandle,
    },

    QueryUpdateInfo {
        query: UpdateQuery,
    },
    CompleteUpdate,
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Event to emit, before any action runs
    pub event: Option<BridgeEvent>,
    /// Actions for the engine to perform, in order
    pub actions: Vec<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            ..Default::default()
        }
    }

    pub fn event(event: BridgeEvent) -> Self {
        Self {
            event: Some(event),
            ..Default::default()
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            actions: vec![action],
            ..Default::default()
        }
    }

    pub fn task(task: Task) -> Self {
        Self::action(UpdateAction::SpawnTask(task))
    }

    pub fn launch(target: LaunchTarget, continuation: Continuation) -> Self {
        Self::action(UpdateAction::Launch(LaunchRequest {
            target,
            continuation,
        }))
    }

    pub fn with_event(mut self, event: BridgeEvent) -> Self {
        if let Some(previous) = self.event.replace(event) {
            warn!("Event {} superseded in a single update", previous.name());
        }
        self
    }

    pub fn with_action(mut self, action: UpdateAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Append another result's actions and take its event if this one has none
    pub fn merge(mut self, other: UpdateResult) -> Self {
        if let Some(event) = other.event {
            self = self.with_event(event);
        }
        self.actions.extend(other.actions);
        if self.message.is_none() {
            self.message = other.message;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.event.is_none() && self.actions.is_empty()
    }
}

/// Process a message and update state
pub fn update<I: IdentityPlatform>(state: &mut BridgeState<I>, message: Message) -> UpdateResult {
    match message {
        Message::Command(command) => handle_command(state, command),

        Message::ActivityResult {
            request_code,
            result_code,
            payload,
        } => handle_activity_result(state, request_code, result_code, payload),

        Message::LaunchFailed {
            continuation,
            reason,
        } => match continuation {
            Continuation::UpdateFlow { mode } => state.updates.on_launch_failed(mode, &reason),
            other => state.session.on_launch_failed(other, &reason),
        },

        // ─────────────────────────────────────────────────────────
        // Identity completions
        // ─────────────────────────────────────────────────────────
        Message::SilentSignInCompleted { epoch, result } => {
            state.session.on_silent_sign_in(epoch, result)
        }
        Message::SignOutCompleted { result } => state.session.on_sign_out_completed(result),
        Message::PlayerLoaded { epoch, result } => state.session.on_player_loaded(epoch, result),
        Message::TopScoresLoaded {
            epoch,
            leaderboard,
            result,
        } => state.session.on_top_scores(epoch, &leaderboard, result),
        Message::PlayerScoreLoaded {
            epoch,
            leaderboard,
            result,
        } => state.session.on_player_score(epoch, &leaderboard, result),
        Message::PresentationIntentReady {
            epoch,
            surface,
            result,
        } => state.session.on_presentation_intent(epoch, surface, result),
        Message::CaptureIntentReady { epoch, result } => {
            state.session.on_capture_intent(epoch, result)
        }

        // ─────────────────────────────────────────────────────────
        // Update completions
        // ─────────────────────────────────────────────────────────
        Message::UpdateInfoLoaded { query, result } => state.updates.on_update_info(query, result),
        Message::InstallStateChanged(install) => state.updates.on_install_state(install),
        Message::InstallListenerRegistered(id) => state.updates.on_listener_registered(id),
    }
}

fn handle_command<I: IdentityPlatform>(state: &mut BridgeState<I>, command: Command) -> UpdateResult {
    match command {
        Command::Initialize => state.session.initialize(),
        Command::SignIn => state.session.sign_in(),
        Command::SignOut => state.session.sign_out(),
        Command::IncreaseAchievement { achievement, steps } => {
            state.session.increase_achievement(achievement, steps)
        }
        Command::UnlockAchievement { achievement } => state.session.unlock_achievement(achievement),
        Command::SubmitScore { leaderboard, score } => state.session.submit_score(leaderboard, score),
        Command::LoadTopScores { leaderboard, max } => state.session.load_top_scores(leaderboard, max),
        Command::LoadPlayerScore { leaderboard } => state.session.load_player_score(leaderboard),
        Command::ShowAchievements => state.session.show(Surface::Achievements),
        Command::ShowLeaderboard { leaderboard } => {
            state.session.show(Surface::Leaderboard(leaderboard))
        }
        Command::ShowAllLeaderboards => state.session.show(Surface::AllLeaderboards),
        Command::Record => state.session.record(),

        Command::StartCheck(config) => state.updates.start_check(config),
        Command::StartUpdate {
            mode,
            allow_asset_pack_deletion,
        } => state.updates.start_update(mode, allow_asset_pack_deletion),
        Command::CompleteUpdate => state.updates.complete_update(),

        Command::Resume => state.updates.resume(),
        Command::Teardown => handle_teardown(state),
    }
}

/// Dispatch an activity result to the continuation registered under its code
fn handle_activity_result<I: IdentityPlatform>(
    state: &mut BridgeState<I>,
    request_code: i32,
    result_code: i32,
    payload: Option<ActivityPayload>,
) -> UpdateResult {
    let continuation = match state.router.take(request_code) {
        Ok(continuation) => continuation,
        Err(e) => {
            warn!(request_code, result_code, "Dropping activity result: {}", e);
            return UpdateResult::none();
        }
    };

    match continuation {
        Continuation::InteractiveSignIn | Continuation::SignInResolution => state
            .session
            .on_sign_in_result(result_code, payload.as_ref()),
        Continuation::Presentation(surface) => {
            debug!("{} closed with result {}", surface.operation(), result_code);
            UpdateResult::none()
        }
        Continuation::VideoCapture => {
            debug!("Capture overlay closed with result {}", result_code);
            UpdateResult::none()
        }
        Continuation::UpdateFlow { mode } => state.updates.on_flow_result(mode, result_code),
    }
}

/// Drop all controller state and outstanding requests without terminal events
fn handle_teardown<I: IdentityPlatform>(state: &mut BridgeState<I>) -> UpdateResult {
    state.session.teardown();
    let dropped = state.router.clear();
    if dropped > 0 {
        info!("Teardown dropped {} pending request(s)", dropped);
    }
    state.updates.teardown()
}
