//! playbridge-app - Session/update correlation layer for Play Bridge
//!
//! This crate implements the TEA (The Elm Architecture) pattern: every host
//! command and every vendor completion is a [`Message`], processed one at a
//! time by [`handler::update`] on the [`Engine`]'s serialized context. The
//! update function mutates controller state and returns at most one
//! [`BridgeEvent`](playbridge_core::BridgeEvent) plus follow-up actions
//! (vendor tasks, foreground launches).
//!
//! - [`SessionController`]: sign-in lifecycle, game clients, profile
//! - [`UpdateController`]: update check policy and update flow outcomes
//! - [`ResultRouter`]: request code → pending continuation, consumed once
//! - [`EventEmitter`]: one-way event channel to the host

pub mod actions;
pub mod app_update;
pub mod config;
pub mod emitter;
pub mod engine;
pub mod handler;
pub mod message;
pub mod router;
pub mod session;
pub mod state;

pub use app_update::{UpdateCheckResult, UpdateController, UpdateFlowState, UpdatePhase, UpdateQuery};
pub use config::{load_settings, BridgeSettings, CheckConfig};
pub use emitter::{EventEmitter, EventReceiver};
pub use engine::Engine;
pub use handler::{LaunchRequest, LaunchTarget, Task, UpdateAction, UpdateResult};
pub use message::{Command, Completion, Message};
pub use router::{Continuation, ResultRouter, Surface};
pub use session::{SessionController, SessionPhase, SessionState};
pub use state::BridgeState;
