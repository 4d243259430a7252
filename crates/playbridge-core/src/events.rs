//! Outbound events delivered to the host
//!
//! The catalogue is closed: every event the host can ever observe is a
//! variant of [`BridgeEvent`], and each variant fixes its payload shape.
//! Emitting an undeclared name or the wrong payload is therefore a compile
//! error rather than a runtime surprise.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{PlayerProfile, ScoreRecord, UpdateOffer};

/// Declared payload shape of an event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// No payload
    None,
    /// A single structured record
    Record,
    /// A sequence of structured records
    Records,
}

/// Payload of the optional `operation_failed` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    /// Host-facing operation name, e.g. `load_top_scores`
    pub op: String,
    pub reason: String,
}

impl OperationFailure {
    pub fn new(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            reason: reason.into(),
        }
    }
}

/// Events emitted to the host.
///
/// Each value is constructed once and consumed once by the emitter.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    // ─────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────
    SignedIn,
    SignedOut,
    /// Fetched after `SignedIn`; may arrive late or never
    ProfileUpdated(PlayerProfile),

    // ─────────────────────────────────────────────────────────
    // Leaderboards / Capture
    // ─────────────────────────────────────────────────────────
    ScoresLoaded(Vec<ScoreRecord>),
    ScoreLoaded(ScoreRecord),
    RecordingStarted,

    // ─────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────
    UpdateAvailable(UpdateOffer),
    /// A flexible download finished and the app can be restarted
    UpdateDownloaded,
    UpdateSuccess,
    UpdateCanceled,
    UpdateFailed,

    // ─────────────────────────────────────────────────────────
    // Diagnostics (opt-in)
    // ─────────────────────────────────────────────────────────
    OperationFailed(OperationFailure),
}

impl BridgeEvent {
    /// Every event name with its payload shape, in declaration order.
    pub fn catalogue() -> &'static [(&'static str, PayloadShape)] {
        &[
            ("signed_in", PayloadShape::None),
            ("signed_out", PayloadShape::None),
            ("profile_updated", PayloadShape::Record),
            ("scores_loaded", PayloadShape::Records),
            ("score_loaded", PayloadShape::Record),
            ("recording_started", PayloadShape::None),
            ("update_available", PayloadShape::Record),
            ("update_downloaded", PayloadShape::None),
            ("update_success", PayloadShape::None),
            ("update_canceled", PayloadShape::None),
            ("update_failed", PayloadShape::None),
            ("operation_failed", PayloadShape::Record),
        ]
    }

    /// Host-facing event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn => "signed_in",
            Self::SignedOut => "signed_out",
            Self::ProfileUpdated(_) => "profile_updated",
            Self::ScoresLoaded(_) => "scores_loaded",
            Self::ScoreLoaded(_) => "score_loaded",
            Self::RecordingStarted => "recording_started",
            Self::UpdateAvailable(_) => "update_available",
            Self::UpdateDownloaded => "update_downloaded",
            Self::UpdateSuccess => "update_success",
            Self::UpdateCanceled => "update_canceled",
            Self::UpdateFailed => "update_failed",
            Self::OperationFailed(_) => "operation_failed",
        }
    }

    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::ProfileUpdated(_)
            | Self::ScoreLoaded(_)
            | Self::UpdateAvailable(_)
            | Self::OperationFailed(_) => PayloadShape::Record,
            Self::ScoresLoaded(_) => PayloadShape::Records,
            _ => PayloadShape::None,
        }
    }

    /// Payload as a structured value, keyed the way the host expects.
    ///
    /// Returns `None` for payload-less events.
    pub fn payload(&self) -> Option<Value> {
        let value = match self {
            Self::ProfileUpdated(profile) => serde_json::to_value(profile),
            Self::ScoresLoaded(scores) => serde_json::to_value(scores),
            Self::ScoreLoaded(score) => serde_json::to_value(score),
            Self::UpdateAvailable(offer) => serde_json::to_value(offer),
            Self::OperationFailed(failure) => serde_json::to_value(failure),
            _ => return None,
        };

        match value {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Failed to serialize payload for '{}': {}", self.name(), e);
                None
            }
        }
    }
}
