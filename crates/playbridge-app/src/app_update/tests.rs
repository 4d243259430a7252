use playbridge_core::{BridgeEvent, OperationFailure, UpdateMode, UpdateOffer};
use playbridge_vendor::{
    AppUpdateInfo, InstallState, InstallStatus, ListenerId, UpdateAvailability,
    RESULT_CANCELED, RESULT_IN_APP_UPDATE_FAILED, RESULT_OK,
};

use super::*;
use crate::config::CheckConfig;
use crate::handler::{LaunchTarget, Task, UpdateAction, UpdateResult};
use crate::router::Continuation;

fn info(staleness: Option<i32>) -> AppUpdateInfo {
    AppUpdateInfo {
        package_name: "com.example.game".to_string(),
        availability: UpdateAvailability::Available,
        install_status: InstallStatus::Unknown,
        available_version_code: 31,
        staleness_days: staleness,
        immediate_allowed: true,
        flexible_allowed: true,
    }
}

/// Run a check to completion and return the completion's result
fn checked(controller: &mut UpdateController, config: CheckConfig, info: AppUpdateInfo) -> UpdateResult {
    controller.start_check(config);
    controller.on_update_info(UpdateQuery::Check(config), Ok(info))
}

fn has_action(result: &UpdateResult, wanted: &UpdateAction) -> bool {
    result.actions.iter().any(|action| action == wanted)
}

// ─────────────────────────────────────────────────────────
// Check
// ─────────────────────────────────────────────────────────

#[test]
fn test_flexible_check_registers_listener_once() {
    let mut controller = UpdateController::new(false);

    let first = controller.start_check(CheckConfig::flexible(1));
    assert!(has_action(&first, &UpdateAction::RegisterInstallListener));
    assert!(matches!(
        first.actions.last(),
        Some(UpdateAction::SpawnTask(Task::QueryUpdateInfo { .. }))
    ));
    assert_eq!(controller.phase(), UpdatePhase::Checking);

    let second = controller.start_check(CheckConfig::flexible(1));
    assert!(!has_action(&second, &UpdateAction::RegisterInstallListener));
}

#[test]
fn test_immediate_check_does_not_register_listener() {
    let mut controller = UpdateController::new(false);
    let result = controller.start_check(CheckConfig::immediate());
    assert!(!has_action(&result, &UpdateAction::RegisterInstallListener));
}

#[test]
fn test_flexible_below_staleness_gate_emits_nothing() {
    let mut controller = UpdateController::new(false);
    let result = checked(&mut controller, CheckConfig::flexible(5), info(Some(3)));

    assert!(result.is_empty());
    assert_eq!(controller.phase(), UpdatePhase::Checked);
}

#[test]
fn test_flexible_above_staleness_gate_offers_update() {
    let mut controller = UpdateController::new(false);
    let result = checked(&mut controller, CheckConfig::flexible(5), info(Some(7)));

    assert_eq!(
        result.event,
        Some(BridgeEvent::UpdateAvailable(UpdateOffer {
            package: "com.example.game".to_string(),
            version: 31,
            mode: UpdateMode::Flexible,
        }))
    );
    assert!(controller.is_update_available());
}

#[test]
fn test_immediate_requires_permission() {
    let mut controller = UpdateController::new(false);
    let mut denied = info(Some(100));
    denied.immediate_allowed = false;

    assert!(checked(&mut controller, CheckConfig::immediate(), denied).is_empty());
}

#[test]
fn test_no_update_available() {
    let mut controller = UpdateController::new(false);
    let mut none = info(Some(100));
    none.availability = UpdateAvailability::NotAvailable;

    assert!(checked(&mut controller, CheckConfig::immediate(), none).is_empty());
    assert!(!controller.is_update_available());
    assert!(controller.last_check().is_some());
}

#[test]
fn test_check_failure_is_silent_by_default() {
    let mut controller = UpdateController::new(false);
    controller.start_check(CheckConfig::immediate());

    let result = controller.on_update_info(
        UpdateQuery::Check(CheckConfig::immediate()),
        Err("unreachable".to_string()),
    );
    assert!(result.is_empty());
    assert_eq!(controller.phase(), UpdatePhase::Idle);
}

#[test]
fn test_check_failure_reported_when_enabled() {
    let mut controller = UpdateController::new(true);
    controller.start_check(CheckConfig::immediate());

    let result = controller.on_update_info(
        UpdateQuery::Check(CheckConfig::immediate()),
        Err("unreachable".to_string()),
    );
    assert_eq!(
        result.event,
        Some(BridgeEvent::OperationFailed(OperationFailure::new(
            "start_check",
            "unreachable"
        )))
    );
}

// ─────────────────────────────────────────────────────────
// Flow
// ─────────────────────────────────────────────────────────

#[test]
fn test_start_update_without_check_is_noop() {
    let mut controller = UpdateController::new(false);
    assert!(controller.start_update(UpdateMode::Immediate, false).is_empty());
    assert_eq!(controller.phase(), UpdatePhase::Idle);
}

#[test]
fn test_start_update_after_empty_check_is_noop() {
    let mut controller = UpdateController::new(false);
    let mut none = info(Some(100));
    none.availability = UpdateAvailability::NotAvailable;
    checked(&mut controller, CheckConfig::immediate(), none);

    assert!(!controller.is_update_available());
    assert!(controller.start_update(UpdateMode::Immediate, false).is_empty());
    assert_eq!(controller.phase(), UpdatePhase::Checked);
}

#[test]
fn test_start_update_launches_with_options() {
    let mut controller = UpdateController::new(false);
    checked(&mut controller, CheckConfig::immediate(), info(Some(1)));

    let result = controller.start_update(UpdateMode::Immediate, true);
    match result.actions.as_slice() {
        [UpdateAction::Launch(request)] => {
            assert_eq!(
                request.continuation,
                Continuation::UpdateFlow {
                    mode: UpdateMode::Immediate
                }
            );
            match &request.target {
                LaunchTarget::UpdateFlow { info, options } => {
                    assert_eq!(info.available_version_code, 31);
                    assert_eq!(options.mode, UpdateMode::Immediate);
                    assert!(options.allow_asset_pack_deletion);
                }
                other => panic!("expected update flow, got {other:?}"),
            }
        }
        other => panic!("expected one launch, got {other:?}"),
    }
    assert!(controller.flow_state().pending);

    // A second start while the flow is pending does nothing
    assert!(controller.start_update(UpdateMode::Immediate, true).is_empty());
}

#[test]
fn test_flow_result_codes() {
    let cases = [
        (RESULT_OK, Some(BridgeEvent::UpdateSuccess)),
        (RESULT_CANCELED, Some(BridgeEvent::UpdateCanceled)),
        (RESULT_IN_APP_UPDATE_FAILED, Some(BridgeEvent::UpdateFailed)),
        (7, None),
    ];

    for (code, expected) in cases {
        let mut controller = UpdateController::new(false);
        checked(&mut controller, CheckConfig::immediate(), info(Some(1)));
        controller.start_update(UpdateMode::Immediate, false);

        let result = controller.on_flow_result(UpdateMode::Immediate, code);
        assert_eq!(result.event, expected, "result code {code}");
        assert!(result.actions.is_empty());
        assert_eq!(controller.phase(), UpdatePhase::Checked);
    }
}

#[test]
fn test_launch_failure_returns_to_checked() {
    let mut controller = UpdateController::new(false);
    checked(&mut controller, CheckConfig::immediate(), info(Some(1)));
    controller.start_update(UpdateMode::Flexible, false);

    let result = controller.on_launch_failed(UpdateMode::Flexible, "rejected");
    assert!(result.is_empty());
    assert_eq!(controller.phase(), UpdatePhase::Checked);
}

// ─────────────────────────────────────────────────────────
// Resume / listener
// ─────────────────────────────────────────────────────────

#[test]
fn test_resume_relaunches_developer_triggered_update() {
    let mut controller = UpdateController::new(false);
    assert!(matches!(
        controller.resume().actions.as_slice(),
        [UpdateAction::SpawnTask(Task::QueryUpdateInfo {
            query: UpdateQuery::Resume
        })]
    ));

    let mut in_progress = info(None);
    in_progress.availability = UpdateAvailability::DeveloperTriggeredInProgress;
    let result = controller.on_update_info(UpdateQuery::Resume, Ok(in_progress));

    match result.actions.as_slice() {
        [UpdateAction::Launch(request)] => assert_eq!(
            request.continuation,
            Continuation::UpdateFlow {
                mode: UpdateMode::Immediate
            }
        ),
        other => panic!("expected relaunch, got {other:?}"),
    }
    assert!(result.event.is_none());
}

#[test]
fn test_resume_surfaces_downloaded_update() {
    let mut controller = UpdateController::new(false);
    let mut downloaded = info(Some(2));
    downloaded.install_status = InstallStatus::Downloaded;

    let result = controller.on_update_info(UpdateQuery::Resume, Ok(downloaded));
    assert_eq!(result.event, Some(BridgeEvent::UpdateDownloaded));
    assert!(result.actions.is_empty());
}

#[test]
fn test_install_listener_reports_download() {
    let mut controller = UpdateController::new(false);
    controller.start_check(CheckConfig::flexible(1));
    controller.on_listener_registered(ListenerId(1));
    assert!(controller.flow_state().listener_registered);

    let downloading = controller.on_install_state(InstallState::new(InstallStatus::Downloading));
    assert!(downloading.is_empty());

    let downloaded = controller.on_install_state(InstallState::new(InstallStatus::Downloaded));
    assert_eq!(downloaded.event, Some(BridgeEvent::UpdateDownloaded));
}

#[test]
fn test_teardown_unregisters_listener_idempotently() {
    let mut controller = UpdateController::new(false);
    checked(&mut controller, CheckConfig::flexible(1), info(Some(5)));
    controller.on_listener_registered(ListenerId(9));

    let first = controller.teardown();
    assert!(has_action(
        &first,
        &UpdateAction::UnregisterInstallListener(ListenerId(9))
    ));
    assert!(!controller.is_update_available());
    assert_eq!(controller.phase(), UpdatePhase::Idle);

    assert!(controller.teardown().is_empty());
    assert!(controller
        .on_install_state(InstallState::new(InstallStatus::Downloaded))
        .is_empty());
}

#[test]
fn test_listener_registered_after_teardown_is_released() {
    let mut controller = UpdateController::new(false);
    controller.start_check(CheckConfig::flexible(1));
    controller.teardown();

    let result = controller.on_listener_registered(ListenerId(3));
    assert!(has_action(
        &result,
        &UpdateAction::UnregisterInstallListener(ListenerId(3))
    ));
}

#[test]
fn test_complete_update_spawns_task() {
    let mut controller = UpdateController::new(false);
    assert!(matches!(
        controller.complete_update().actions.as_slice(),
        [UpdateAction::SpawnTask(Task::CompleteUpdate)]
    ));
}
