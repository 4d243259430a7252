//! Host foreground-activity seam
//!
//! The host owns the foreground context. Launched flows report back later
//! through the host's single activity-result funnel, tagged with the request
//! code they were launched under.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use playbridge_core::prelude::*;

/// Activity finished normally
pub const RESULT_OK: i32 = -1;
/// Activity was dismissed by the user
pub const RESULT_CANCELED: i32 = 0;
/// Vendor update flow reported an install failure
pub const RESULT_IN_APP_UPDATE_FAILED: i32 = 1;

/// Vendor-constructed intent to present a foreground UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }
}

/// Vendor-provided recovery action for a recoverable sign-in failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub token: String,
}

/// Opaque data returned alongside an activity result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityPayload(pub Value);

/// Launches foreground flows on the host.
///
/// Both calls are synchronous: they hand the flow to the host and return.
/// The outcome arrives later as an activity result.
pub trait HostActivity: Send + Sync {
    /// Present a vendor intent and report its result under `request_code`
    fn launch_intent(&self, intent: &Intent, request_code: i32) -> Result<()>;

    /// Start a sign-in resolution and report its result under `request_code`
    fn launch_resolution(&self, resolution: &Resolution, request_code: i32) -> Result<()>;
}
