//! Result routing for foreground flows
//!
//! The host reports every activity result through one funnel as
//! `(request_code, result_code, payload)`. This module keeps the table of
//! launched-but-unanswered flows and hands each result to the continuation
//! registered for its code, exactly once.

use std::collections::HashMap;
use std::time::Instant;

use playbridge_core::prelude::*;
use playbridge_core::{RequestCode, UpdateMode};

/// Presentation surfaces opened from the session controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Achievements,
    Leaderboard(String),
    AllLeaderboards,
}

impl Surface {
    pub fn request_code(&self) -> RequestCode {
        match self {
            Surface::Achievements => RequestCode::Achievements,
            Surface::Leaderboard(_) | Surface::AllLeaderboards => RequestCode::Leaderboard,
        }
    }

    /// Host-facing operation name
    pub fn operation(&self) -> &'static str {
        match self {
            Surface::Achievements => "show_achievements",
            Surface::Leaderboard(_) => "show_leaderboard",
            Surface::AllLeaderboards => "show_all_leaderboards",
        }
    }
}

/// What must resume when a result arrives for a launched flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    InteractiveSignIn,
    SignInResolution,
    Presentation(Surface),
    VideoCapture,
    UpdateFlow { mode: UpdateMode },
}

impl Continuation {
    pub fn request_code(&self) -> RequestCode {
        match self {
            Continuation::InteractiveSignIn | Continuation::SignInResolution => RequestCode::SignIn,
            Continuation::Presentation(surface) => surface.request_code(),
            Continuation::VideoCapture => RequestCode::VideoCapture,
            Continuation::UpdateFlow { .. } => RequestCode::UpdateFlow,
        }
    }
}

/// A launched flow awaiting its result
#[derive(Debug)]
struct PendingRequest {
    continuation: Continuation,
    registered_at: Instant,
}

/// Correlation table: request code → pending continuation
#[derive(Debug, Default)]
pub struct ResultRouter {
    pending: HashMap<RequestCode, PendingRequest>,
}

impl ResultRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a continuation at launch time. Returns the code to launch under.
    pub fn register(&mut self, continuation: Continuation) -> RequestCode {
        let code = continuation.request_code();
        let pending = PendingRequest {
            continuation,
            registered_at: Instant::now(),
        };

        if let Some(previous) = self.pending.insert(code, pending) {
            warn!(
                "Replacing pending {:?} under {}; its result will resume the new flow",
                previous.continuation, code
            );
        } else {
            debug!("Registered pending request under {}", code);
        }
        code
    }

    /// Withdraw a registration whose launch never happened
    pub fn cancel(&mut self, code: RequestCode) -> Option<Continuation> {
        self.pending.remove(&code).map(|p| p.continuation)
    }

    /// Consume the continuation for a delivered result.
    ///
    /// The entry is removed before it is returned, so a continuation that
    /// launches a new flow under the same code registers a fresh entry.
    pub fn take(&mut self, request_code: i32) -> Result<Continuation> {
        let code = RequestCode::from_code(request_code)
            .ok_or(Error::UnknownRequestCode { code: request_code })?;

        let pending = self
            .pending
            .remove(&code)
            .ok_or(Error::NoPendingRequest { code: request_code })?;

        debug!(
            "Result for {} arrived after {:?}",
            code,
            pending.registered_at.elapsed()
        );
        Ok(pending.continuation)
    }

    /// Drop every pending entry without resuming anything. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, code: RequestCode) -> bool {
        self.pending.contains_key(&code)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

}
