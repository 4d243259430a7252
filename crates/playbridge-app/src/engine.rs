//! Engine - the serialized execution context
//!
//! The Engine owns all controller state, the result router and the event
//! emitter. Host commands and vendor completions both become [`Message`]s and
//! are processed one at a time, so no state is ever touched from a vendor
//! thread.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (mut engine, mut events) = Engine::new(identity, updates, host, settings);
//! engine.initialize();
//!
//! // Per frame, on the host thread:
//! engine.drain_pending_messages();
//! for event in events.drain() {
//!     host.dispatch(event.name(), event.payload());
//! }
//! ```
//!
//! Host commands spawn vendor tasks, so they must be called from within a
//! Tokio runtime.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use playbridge_core::prelude::*;
use playbridge_core::{PlayerProfile, UpdateMode};
use playbridge_vendor::{ActivityPayload, HostActivity, IdentityPlatform, UpdatePlatform};

use crate::actions::{self, Services};
use crate::config::{BridgeSettings, CheckConfig};
use crate::emitter::{self, EventEmitter, EventReceiver};
use crate::handler;
use crate::message::{Command, Message};
use crate::state::BridgeState;

/// Capacity of the vendor completion channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// The bridge engine. One per host process.
pub struct Engine<I, U, H> {
    state: BridgeState<I>,
    services: Services<I, U, H>,
    emitter: EventEmitter,
    msg_tx: mpsc::Sender<Message>,
    msg_rx: mpsc::Receiver<Message>,
    tasks: JoinSet<()>,
    settings: BridgeSettings,
}

impl<I, U, H> Engine<I, U, H>
where
    I: IdentityPlatform + Send + Sync + 'static,
    U: UpdatePlatform + Send + Sync + 'static,
    H: HostActivity + 'static,
{
    /// Create an engine and the receiver the host reads events from
    pub fn new(
        identity: Arc<I>,
        updates: Arc<U>,
        host: Arc<H>,
        settings: BridgeSettings,
    ) -> (Self, EventReceiver) {
        let (emitter, receiver) = emitter::channel();
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);

        let engine = Self {
            state: BridgeState::new(Arc::clone(&identity), &settings),
            services: Services {
                identity,
                updates,
                host,
            },
            emitter,
            msg_tx,
            msg_rx,
            tasks: JoinSet::new(),
            settings,
        };
        (engine, receiver)
    }

    pub fn state(&self) -> &BridgeState<I> {
        &self.state
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Number of vendor operations still running
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    // ─────────────────────────────────────────────────────────
    // Message loop
    // ─────────────────────────────────────────────────────────

    /// Process a message and everything it triggers.
    ///
    /// The event is emitted before the actions run; follow-up messages are
    /// processed in FIFO order within this call.
    pub fn process_message(&mut self, msg: Message) {
        let mut queue = VecDeque::from([msg]);

        while let Some(msg) = queue.pop_front() {
            let result = handler::update(&mut self.state, msg);

            if let Some(event) = result.event {
                self.emitter.emit(event);
            }

            for action in result.actions {
                if let Some(follow_up) = actions::handle_action(
                    action,
                    &mut self.state.router,
                    &self.services,
                    &self.msg_tx,
                    &mut self.tasks,
                ) {
                    queue.push_back(follow_up);
                }
            }

            if let Some(follow_up) = result.message {
                queue.push_back(follow_up);
            }
        }
    }

    /// Process every completion already queued. Never blocks.
    pub fn drain_pending_messages(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            Self::log_join(joined);
        }
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
        }
    }

    /// Wait for one vendor completion and process it.
    ///
    /// Returns `false` if nothing is queued and no vendor operation is running.
    pub async fn next_message(&mut self) -> bool {
        loop {
            if self.tasks.is_empty() && self.msg_rx.is_empty() {
                return false;
            }

            let msg = tokio::select! {
                Some(msg) = self.msg_rx.recv() => Some(msg),
                Some(joined) = self.tasks.join_next() => {
                    Self::log_join(joined);
                    None
                }
                else => None,
            };

            if let Some(msg) = msg {
                self.process_message(msg);
                return true;
            }
        }
    }

    /// Wait until no vendor operation is running and nothing is queued
    pub async fn settle(&mut self) {
        while self.next_message().await {}
        self.drain_pending_messages();
    }

    /// Teardown hook. Drops all controller state and pending requests without
    /// emitting terminal events, releases the install-state listener and
    /// discards in-flight vendor work. Idempotent.
    pub fn shutdown(&mut self) {
        self.process_message(Command::Teardown.into());

        self.tasks.abort_all();
        let mut discarded = 0usize;
        while let Ok(msg) = self.msg_rx.try_recv() {
            trace!("Discarding {:?} on shutdown", msg);
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} queued completion(s) on shutdown", discarded);
        }
    }

    fn log_join(joined: std::result::Result<(), JoinError>) {
        if let Err(e) = joined {
            if e.is_panic() {
                error!("Vendor task panicked: {}", e);
            } else {
                trace!("Vendor task cancelled");
            }
        }
    }

    fn command(&mut self, command: Command) {
        debug!("Host command: {:?}", command);
        self.process_message(Message::Command(command));
    }

    // ─────────────────────────────────────────────────────────
    // Host surface: session
    // ─────────────────────────────────────────────────────────

    pub fn initialize(&mut self) {
        self.command(Command::Initialize);
    }

    pub fn is_available(&self) -> bool {
        self.state.session.is_available()
    }

    pub fn is_connected(&self) -> bool {
        self.state.session.is_connected()
    }

    pub fn sign_in(&mut self) {
        self.command(Command::SignIn);
    }

    pub fn sign_out(&mut self) {
        self.command(Command::SignOut);
    }

    pub fn increase_achievement(&mut self, achievement: &str, steps: u32) {
        self.command(Command::IncreaseAchievement {
            achievement: achievement.to_string(),
            steps,
        });
    }

    pub fn unlock_achievement(&mut self, achievement: &str) {
        self.command(Command::UnlockAchievement {
            achievement: achievement.to_string(),
        });
    }

    pub fn submit_score(&mut self, leaderboard: &str, score: i64) {
        self.command(Command::SubmitScore {
            leaderboard: leaderboard.to_string(),
            score,
        });
    }

    pub fn load_top_score(&mut self, leaderboard: &str, max: u32) {
        self.command(Command::LoadTopScores {
            leaderboard: leaderboard.to_string(),
            max,
        });
    }

    pub fn load_current_player_score(&mut self, leaderboard: &str) {
        self.command(Command::LoadPlayerScore {
            leaderboard: leaderboard.to_string(),
        });
    }

    pub fn show_achievements(&mut self) {
        self.command(Command::ShowAchievements);
    }

    pub fn show_leaderboard(&mut self, leaderboard: &str) {
        self.command(Command::ShowLeaderboard {
            leaderboard: leaderboard.to_string(),
        });
    }

    pub fn show_all_leaderboards(&mut self) {
        self.command(Command::ShowAllLeaderboards);
    }

    pub fn can_record(&self) -> bool {
        self.state.session.can_record()
    }

    pub fn record(&mut self) {
        self.command(Command::Record);
    }

    pub fn get_player_info(&self) -> PlayerProfile {
        self.state.session.player_info()
    }

    // ─────────────────────────────────────────────────────────
    // Host surface: updates
    // ─────────────────────────────────────────────────────────

    pub fn is_update_available(&self) -> bool {
        self.state.updates.is_update_available()
    }

    pub fn start_check(&mut self, config: CheckConfig) {
        self.command(Command::StartCheck(config));
    }

    /// Parse the host's check dictionary; invalid parameters are logged and ignored
    pub fn start_check_with_params(&mut self, params: &Value) {
        match CheckConfig::from_params(params, self.settings.update.flexible_days) {
            Ok(config) => self.start_check(config),
            Err(e) => warn!("start_check ignored: {}", e),
        }
    }

    pub fn start_update_immediate(&mut self, allow_asset_pack_deletion: bool) {
        self.command(Command::StartUpdate {
            mode: UpdateMode::Immediate,
            allow_asset_pack_deletion,
        });
    }

    pub fn start_update_flexible(&mut self, allow_asset_pack_deletion: bool) {
        self.command(Command::StartUpdate {
            mode: UpdateMode::Flexible,
            allow_asset_pack_deletion,
        });
    }

    pub fn complete_update(&mut self) {
        self.command(Command::CompleteUpdate);
    }

    // ─────────────────────────────────────────────────────────
    // Host surface: lifecycle
    // ─────────────────────────────────────────────────────────

    /// The host's single activity-result funnel
    pub fn on_activity_result(
        &mut self,
        request_code: i32,
        result_code: i32,
        payload: Option<ActivityPayload>,
    ) {
        debug!(request_code, result_code, "Activity result");
        self.process_message(Message::ActivityResult {
            request_code,
            result_code,
            payload,
        });
    }

    pub fn on_resume(&mut self) {
        self.command(Command::Resume);
    }
}
