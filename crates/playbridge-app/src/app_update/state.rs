//! Update-check and update-flow state owned by the update controller

use playbridge_core::{UpdateMode, UpdateOffer};
use playbridge_vendor::{AppUpdateInfo, ListenerId};

use crate::config::CheckConfig;

/// Update flow lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
    #[default]
    Idle,
    Checking,
    Checked,
    /// The vendor flow is on screen, awaiting its result
    FlowLaunched,
}

/// Why update info was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateQuery {
    Check(CheckConfig),
    Resume,
}

/// Outcome of one check, held until superseded or torn down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheckResult {
    pub available: bool,
    pub version_code: i64,
    pub package_id: String,
    pub mode: UpdateMode,
    pub staleness_days: Option<i32>,
    /// Vendor info the update flow is launched with
    pub info: AppUpdateInfo,
}

impl UpdateCheckResult {
    pub fn from_info(info: AppUpdateInfo, mode: UpdateMode) -> Self {
        Self {
            available: info.is_update_available(),
            version_code: info.available_version_code,
            package_id: info.package_name.clone(),
            mode,
            staleness_days: info.staleness_days,
            info,
        }
    }

    /// Whether the host may be offered this update under `config`.
    ///
    /// Immediate mode needs vendor permission. Flexible mode also needs the
    /// update to be at least `flexible_days` stale; unknown staleness never
    /// passes.
    pub fn passes_policy(&self, config: &CheckConfig) -> bool {
        if !self.available {
            return false;
        }
        match self.mode {
            UpdateMode::Immediate => self.info.is_update_type_allowed(UpdateMode::Immediate),
            UpdateMode::Flexible => {
                let staleness = i64::from(self.staleness_days.unwrap_or(-1));
                staleness >= i64::from(config.flexible_days)
                    && self.info.is_update_type_allowed(UpdateMode::Flexible)
            }
        }
    }

    pub fn offer(&self) -> UpdateOffer {
        UpdateOffer {
            package: self.package_id.clone(),
            version: self.version_code,
            mode: self.mode,
        }
    }
}

/// Snapshot of the flow bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFlowState {
    /// A foreground update flow was launched and awaits its result
    pub pending: bool,
    pub listener_registered: bool,
}

/// Install-state listener registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ListenerState {
    #[default]
    None,
    /// Registration action issued, id not yet known
    Requested,
    Registered(ListenerId),
}

impl ListenerState {
    pub(crate) fn is_active(&self) -> bool {
        !matches!(self, ListenerState::None)
    }
}
