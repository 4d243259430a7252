use playbridge_core::prelude::*;
use playbridge_core::{BridgeEvent, OperationFailure, UpdateMode};
use playbridge_vendor::{
    AppUpdateInfo, InstallState, InstallStatus, ListenerId, UpdateAvailability, UpdateOptions,
    RESULT_CANCELED, RESULT_IN_APP_UPDATE_FAILED, RESULT_OK,
};

use crate::config::CheckConfig;
use crate::handler::{LaunchTarget, Task, UpdateAction, UpdateResult};
use crate::message::Completion;
use crate::router::Continuation;

use super::state::{ListenerState, UpdateCheckResult, UpdateFlowState, UpdatePhase, UpdateQuery};

/// Evaluates update availability against policy and drives the vendor flow
#[derive(Debug, Default)]
pub struct UpdateController {
    phase: UpdatePhase,
    check: Option<UpdateCheckResult>,
    listener: ListenerState,
    report_failures: bool,
}

impl UpdateController {
    pub fn new(report_failures: bool) -> Self {
        Self {
            report_failures,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn last_check(&self) -> Option<&UpdateCheckResult> {
        self.check.as_ref()
    }

    pub fn flow_state(&self) -> UpdateFlowState {
        UpdateFlowState {
            pending: self.phase == UpdatePhase::FlowLaunched,
            listener_registered: matches!(self.listener, ListenerState::Registered(_)),
        }
    }

    /// True only when the cached check found an update
    pub fn is_update_available(&self) -> bool {
        self.available_check().is_some()
    }

    /// The cached check, if it found an update. Gates both the read and the flow.
    fn available_check(&self) -> Option<&UpdateCheckResult> {
        self.check.as_ref().filter(|check| check.available)
    }

    // ─────────────────────────────────────────────────────────
    // Check
    // ─────────────────────────────────────────────────────────

    pub fn start_check(&mut self, config: CheckConfig) -> UpdateResult {
        let mut result = UpdateResult::none();

        // Flexible downloads finish in the background; listen so they surface
        if !config.immediate && !self.listener.is_active() {
            self.listener = ListenerState::Requested;
            result = result.with_action(UpdateAction::RegisterInstallListener);
        }

        if self.phase != UpdatePhase::FlowLaunched {
            self.phase = UpdatePhase::Checking;
        }
        debug!(
            "Checking for updates (immediate: {}, flexible_days: {})",
            config.immediate, config.flexible_days
        );
        result.with_action(UpdateAction::SpawnTask(Task::QueryUpdateInfo {
            query: UpdateQuery::Check(config),
        }))
    }

    pub fn on_update_info(
        &mut self,
        query: UpdateQuery,
        result: Completion<AppUpdateInfo>,
    ) -> UpdateResult {
        match (query, result) {
            (UpdateQuery::Check(config), Ok(info)) => self.on_check_completed(config, info),
            (UpdateQuery::Resume, Ok(info)) => self.on_resume_info(info),
            (query, Err(reason)) => {
                warn!("Update info query failed: {}", reason);
                if self.phase == UpdatePhase::Checking {
                    self.settle_phase();
                }
                let op = match query {
                    UpdateQuery::Check(_) => "start_check",
                    UpdateQuery::Resume => "resume",
                };
                self.failure(op, &reason)
            }
        }
    }

    fn on_check_completed(&mut self, config: CheckConfig, info: AppUpdateInfo) -> UpdateResult {
        let mode = if config.immediate {
            UpdateMode::Immediate
        } else {
            UpdateMode::Flexible
        };
        let check = UpdateCheckResult::from_info(info, mode);
        let offer = check.passes_policy(&config).then(|| check.offer());

        if !check.available {
            debug!("No update available ({:?})", check.info.availability);
        } else if offer.is_none() {
            info!(
                "Update {} available but not offered in {} mode (staleness {:?})",
                check.version_code,
                mode.as_str(),
                check.staleness_days
            );
        }

        self.check = Some(check);
        if self.phase == UpdatePhase::Checking {
            self.phase = UpdatePhase::Checked;
        }

        match offer {
            Some(offer) => UpdateResult::event(BridgeEvent::UpdateAvailable(offer)),
            None => UpdateResult::none(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Flow
    // ─────────────────────────────────────────────────────────

    pub fn start_update(&mut self, mode: UpdateMode, allow_asset_pack_deletion: bool) -> UpdateResult {
        let Some(check) = self.available_check() else {
            warn!(
                "start_update ({}) called without a check that found an update; ignoring",
                mode.as_str()
            );
            return UpdateResult::none();
        };

        if self.phase == UpdatePhase::FlowLaunched {
            warn!("An update flow is already awaiting its result; ignoring");
            return UpdateResult::none();
        }

        let info = check.info.clone();
        self.phase = UpdatePhase::FlowLaunched;
        info!("Launching {} update flow", mode.as_str());
        UpdateResult::launch(
            LaunchTarget::UpdateFlow {
                info,
                options: UpdateOptions {
                    mode,
                    allow_asset_pack_deletion,
                },
            },
            Continuation::UpdateFlow { mode },
        )
    }

    /// Map the flow's result code to its terminal event
    pub fn on_flow_result(&mut self, mode: UpdateMode, result_code: i32) -> UpdateResult {
        self.settle_phase();

        let event = match result_code {
            RESULT_OK => BridgeEvent::UpdateSuccess,
            RESULT_CANCELED => BridgeEvent::UpdateCanceled,
            RESULT_IN_APP_UPDATE_FAILED => BridgeEvent::UpdateFailed,
            other => {
                warn!(
                    "Unexpected result code {} from {} update flow",
                    other,
                    mode.as_str()
                );
                return UpdateResult::none();
            }
        };
        info!("{} update flow finished: {}", mode.as_str(), event.name());
        UpdateResult::event(event)
    }

    pub fn on_launch_failed(&mut self, mode: UpdateMode, reason: &str) -> UpdateResult {
        warn!("{} update flow could not be launched: {}", mode.as_str(), reason);
        self.settle_phase();
        UpdateResult::none()
    }

    /// Ask the vendor to install a downloaded flexible update
    pub fn complete_update(&mut self) -> UpdateResult {
        info!("Completing downloaded update");
        UpdateResult::task(Task::CompleteUpdate)
    }

    // ─────────────────────────────────────────────────────────
    // Resume / listener
    // ─────────────────────────────────────────────────────────

    pub fn resume(&mut self) -> UpdateResult {
        UpdateResult::task(Task::QueryUpdateInfo {
            query: UpdateQuery::Resume,
        })
    }

    fn on_resume_info(&mut self, info: AppUpdateInfo) -> UpdateResult {
        let mut result = UpdateResult::none();

        if info.install_status == InstallStatus::Downloaded {
            info!("Flexible update downloaded, ready to restart");
            result = result.with_event(BridgeEvent::UpdateDownloaded);
        }

        if info.availability == UpdateAvailability::DeveloperTriggeredInProgress {
            if self.phase == UpdatePhase::FlowLaunched {
                debug!("Update in progress and its flow is already on screen");
            } else {
                info!("Resuming in-progress immediate update");
                self.phase = UpdatePhase::FlowLaunched;
                let mode = UpdateMode::Immediate;
                result = result.merge(UpdateResult::launch(
                    LaunchTarget::UpdateFlow {
                        info,
                        options: UpdateOptions {
                            mode,
                            allow_asset_pack_deletion: false,
                        },
                    },
                    Continuation::UpdateFlow { mode },
                ));
            }
        }

        result
    }

    pub fn on_install_state(&mut self, install: InstallState) -> UpdateResult {
        if !self.listener.is_active() {
            debug!("Install state {:?} after listener release; ignoring", install.status);
            return UpdateResult::none();
        }

        trace!(
            "Install state {:?} ({}/{} bytes)",
            install.status,
            install.bytes_downloaded,
            install.total_bytes_to_download
        );
        if install.status == InstallStatus::Downloaded {
            info!("Flexible update downloaded, ready to restart");
            return UpdateResult::event(BridgeEvent::UpdateDownloaded);
        }
        UpdateResult::none()
    }

    pub fn on_listener_registered(&mut self, id: ListenerId) -> UpdateResult {
        match self.listener {
            ListenerState::Requested => {
                debug!("Install-state listener registered ({:?})", id);
                self.listener = ListenerState::Registered(id);
                UpdateResult::none()
            }
            _ => {
                debug!("Releasing unneeded install-state listener {:?}", id);
                UpdateResult::action(UpdateAction::UnregisterInstallListener(id))
            }
        }
    }

    /// Release the listener and forget the cached check. Idempotent.
    pub fn teardown(&mut self) -> UpdateResult {
        let listener = std::mem::take(&mut self.listener);
        self.check = None;
        self.phase = UpdatePhase::Idle;

        match listener {
            ListenerState::Registered(id) => {
                UpdateResult::action(UpdateAction::UnregisterInstallListener(id))
            }
            _ => UpdateResult::none(),
        }
    }

    fn settle_phase(&mut self) {
        self.phase = if self.check.is_some() {
            UpdatePhase::Checked
        } else {
            UpdatePhase::Idle
        };
    }

    fn failure(&self, op: &str, reason: &str) -> UpdateResult {
        if !self.report_failures {
            return UpdateResult::none();
        }
        UpdateResult::event(BridgeEvent::OperationFailed(OperationFailure::new(op, reason)))
    }
}
