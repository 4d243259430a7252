use std::sync::Arc;

use playbridge_core::{BridgeEvent, OperationFailure, PlayerProfile};
use playbridge_vendor::sim::{IdentityScript, SimIdentity};
use playbridge_vendor::{Account, IdentityPlatform, LeaderboardScore, Player};

use super::*;
use crate::handler::{LaunchRequest, LaunchTarget, Task, UpdateAction, UpdateResult};
use crate::router::{Continuation, Surface};

fn controller(script: IdentityScript) -> SessionController<SimIdentity> {
    SessionController::new(Arc::new(SimIdentity::new(script)), false)
}

fn cached(account: &str) -> IdentityScript {
    IdentityScript {
        cached_account: Some(account.to_string()),
        ..Default::default()
    }
}

fn launch_of(result: &UpdateResult) -> Option<&LaunchRequest> {
    result.actions.iter().find_map(|action| match action {
        UpdateAction::Launch(request) => Some(request),
        _ => None,
    })
}

fn task_of(result: &UpdateResult) -> Option<&Task> {
    result.actions.iter().find_map(|action| match action {
        UpdateAction::SpawnTask(task) => Some(task),
        _ => None,
    })
}

fn player(id: &str) -> Player {
    Player {
        name: "Ada".to_string(),
        title: "Pathfinder".to_string(),
        player_id: id.to_string(),
        display_name: "ada".to_string(),
        icon_image_uri: None,
    }
}

fn score(rank: i64) -> LeaderboardScore {
    LeaderboardScore {
        rank,
        display_rank: format!("#{rank}"),
        display_score: "1,000".to_string(),
        raw_score: 1000,
        score_tag: None,
        timestamp_millis: 1_700_000_000_000,
    }
}

/// Connected controller plus the epoch of its sign-in cycle
fn connected() -> (SessionController<SimIdentity>, u64) {
    let mut session = controller(cached("ada"));
    session.initialize();
    let epoch = session.state().epoch;
    (session, epoch)
}

fn failure_payload(resolution: Option<&str>) -> playbridge_vendor::ActivityPayload {
    SimIdentity::failure_payload(4, resolution)
}

// ─────────────────────────────────────────────────────────
// Initialize
// ─────────────────────────────────────────────────────────

#[test]
fn test_initialize_unavailable_service() {
    let mut session = controller(IdentityScript {
        available: false,
        ..Default::default()
    });

    let result = session.initialize();
    assert!(result.is_empty());
    assert_eq!(session.phase(), SessionPhase::Unavailable);

    assert!(session.sign_in().is_empty());
    assert!(session.sign_out().is_empty());
    assert!(!session.is_connected());
}

#[test]
fn test_initialize_with_cached_account() {
    let mut session = controller(cached("ada"));

    let result = session.initialize();
    assert_eq!(result.event, Some(BridgeEvent::SignedIn));
    assert!(matches!(
        task_of(&result),
        Some(Task::FetchPlayer { players, .. }) if players.account_id == "ada"
    ));
    assert!(session.is_connected());
    assert!(session.clients().is_some());
}

#[test]
fn test_initialize_without_cached_account_tries_silent() {
    let mut session = controller(IdentityScript::default());

    let result = session.initialize();
    assert!(result.event.is_none());
    assert!(matches!(task_of(&result), Some(Task::SilentSignIn { .. })));
    assert_eq!(session.phase(), SessionPhase::SilentAttempting);
    assert!(session.state().silent_attempted);
}

#[test]
fn test_initialize_twice_is_noop() {
    let (mut session, _) = connected();
    assert!(session.initialize().is_empty());
}

// ─────────────────────────────────────────────────────────
// Silent / interactive sign-in
// ─────────────────────────────────────────────────────────

#[test]
fn test_silent_failure_does_not_escalate() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    let epoch = session.state().epoch;

    let result = session.on_silent_sign_in(epoch, Err("sign-in required".to_string()));
    assert!(result.is_empty());
    assert_eq!(session.phase(), SessionPhase::Disconnected);
}

#[test]
fn test_sign_in_before_initialize_is_noop() {
    let mut session = controller(IdentityScript::default());
    assert!(session.sign_in().is_empty());
}

#[test]
fn test_sign_in_launches_interactive_flow() {
    let mut session = controller(IdentityScript::default());
    session.initialize();

    let result = session.sign_in();
    let launch = launch_of(&result).expect("sign-in launch");
    assert_eq!(launch.continuation, Continuation::InteractiveSignIn);
    assert!(matches!(&launch.target, LaunchTarget::Intent(intent) if intent.action == "games.SIGN_IN"));
    assert!(session.state().intent_in_progress);

    // A second request while the flow is on screen does nothing
    assert!(session.sign_in().is_empty());
}

#[test]
fn test_signed_in_at_most_once_when_silent_and_interactive_race() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    let silent_epoch = session.state().epoch;
    session.sign_in();

    let interactive =
        session.on_sign_in_result(-1, Some(&SimIdentity::success_payload("ada")));
    assert_eq!(interactive.event, Some(BridgeEvent::SignedIn));

    let late_silent = session.on_silent_sign_in(silent_epoch, Ok(Account::new("ada")));
    assert!(late_silent.is_empty());
}

#[test]
fn test_sign_in_result_without_payload_clears_flag() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();

    let result = session.on_sign_in_result(0, None);
    assert!(result.is_empty());
    assert!(!session.state().intent_in_progress);
    assert!(!session.is_connected());
}

// ─────────────────────────────────────────────────────────
// Failure resolution
// ─────────────────────────────────────────────────────────

#[test]
fn test_failure_with_resolution_launches_once() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();

    let first = session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    let launch = launch_of(&first).expect("resolution launch");
    assert_eq!(launch.continuation, Continuation::SignInResolution);
    assert!(matches!(&launch.target, LaunchTarget::Resolution(r) if r.token == "consent"));
    assert!(session.state().resolving_failure);

    let second = session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    assert!(second.is_empty());
}

#[test]
fn test_failure_after_silent_connect_is_not_resolved() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    let epoch = session.state().epoch;
    session.sign_in();

    let silent = session.on_silent_sign_in(epoch, Ok(Account::new("ada")));
    assert_eq!(silent.event, Some(BridgeEvent::SignedIn));

    // The interactive flow that was still on screen now reports a failure
    let result = session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    assert!(launch_of(&result).is_none());
    assert!(result.is_empty());
    assert!(!session.state().resolving_failure);
    assert_eq!(session.phase(), SessionPhase::Connected);
}

#[test]
fn test_failure_without_resolution_is_logged_only() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();

    let result = session.on_sign_in_result(0, Some(&failure_payload(None)));
    assert!(result.is_empty());
    assert!(!session.state().resolving_failure);
}

#[test]
fn test_resolution_launch_failure_retries_sign_in_once() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();
    session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));

    let retry = session.on_launch_failed(Continuation::SignInResolution, "no activity");
    let launch = launch_of(&retry).expect("fallback sign-in launch");
    assert_eq!(launch.continuation, Continuation::InteractiveSignIn);

    // The retry's own failure is not resolved again
    let after = session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    assert!(after.is_empty());
}

#[test]
fn test_explicit_sign_in_starts_new_episode() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();
    session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));

    session.sign_in();
    assert!(!session.state().resolving_failure);
    let result = session.on_sign_in_result(0, Some(&failure_payload(Some("consent"))));
    assert!(launch_of(&result).is_some());
}

#[test]
fn test_interactive_launch_failure_clears_flag() {
    let mut session = controller(IdentityScript::default());
    session.initialize();
    session.sign_in();

    let result = session.on_launch_failed(Continuation::InteractiveSignIn, "no activity");
    assert!(result.is_empty());
    assert!(!session.state().intent_in_progress);
}

// ─────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────

#[test]
fn test_profile_updated_after_sign_in() {
    let (mut session, epoch) = connected();
    assert_eq!(session.player_info(), PlayerProfile::default());

    let result = session.on_player_loaded(epoch, Ok(player("p-1")));
    match result.event {
        Some(BridgeEvent::ProfileUpdated(profile)) => assert_eq!(profile.player_id, "p-1"),
        other => panic!("expected profile_updated, got {other:?}"),
    }
    assert_eq!(session.player_info().title, "Pathfinder");
}

#[test]
fn test_profile_from_previous_cycle_is_discarded() {
    let (mut session, epoch) = connected();
    session.on_sign_out_completed(Ok(()));

    let result = session.on_player_loaded(epoch, Ok(player("p-1")));
    assert!(result.is_empty());
    assert_eq!(session.player_info(), PlayerProfile::default());
}

#[test]
fn test_profile_failure_is_silent_by_default() {
    let (mut session, epoch) = connected();
    assert!(session
        .on_player_loaded(epoch, Err("player unavailable".to_string()))
        .is_empty());
}

#[test]
fn test_profile_failure_reported_when_enabled() {
    let mut session = SessionController::new(Arc::new(SimIdentity::new(cached("ada"))), true);
    session.initialize();
    let epoch = session.state().epoch;

    let result = session.on_player_loaded(epoch, Err("player unavailable".to_string()));
    assert_eq!(
        result.event,
        Some(BridgeEvent::OperationFailed(OperationFailure::new(
            "get_player_info",
            "player unavailable"
        )))
    );
}

// ─────────────────────────────────────────────────────────
// Sign-out
// ─────────────────────────────────────────────────────────

#[test]
fn test_sign_out_emits_once_and_clears() {
    let (mut session, _) = connected();

    assert!(matches!(task_of(&session.sign_out()), Some(Task::SignOut)));
    let first = session.on_sign_out_completed(Ok(()));
    assert_eq!(first.event, Some(BridgeEvent::SignedOut));
    assert!(session.clients().is_none());

    assert!(matches!(task_of(&session.sign_out()), Some(Task::SignOut)));
    let second = session.on_sign_out_completed(Ok(()));
    assert!(second.is_empty());
}

#[test]
fn test_sign_out_failure_still_clears_local_state() {
    let (mut session, _) = connected();
    let result = session.on_sign_out_completed(Err("service disconnected".to_string()));
    assert_eq!(result.event, Some(BridgeEvent::SignedOut));
    assert_eq!(session.phase(), SessionPhase::Disconnected);
}

// ─────────────────────────────────────────────────────────
// Connected-gated commands
// ─────────────────────────────────────────────────────────

#[test]
fn test_gated_commands_noop_when_disconnected() {
    let mut session = controller(IdentityScript::default());
    session.initialize();

    assert!(session.increase_achievement("a".into(), 1).is_empty());
    assert!(session.unlock_achievement("a".into()).is_empty());
    assert!(session.submit_score("lb".into(), 5).is_empty());
    assert!(session.load_top_scores("lb".into(), 10).is_empty());
    assert!(session.load_player_score("lb".into()).is_empty());
    assert!(session.show(Surface::Achievements).is_empty());
    assert!(session.show(Surface::AllLeaderboards).is_empty());
    assert!(session.record().is_empty());
    assert!(!session.can_record());
}

#[test]
fn test_writes_are_fire_and_forget_tasks() {
    let (mut session, _) = connected();

    let result = session.submit_score("lb".into(), 5);
    assert!(result.event.is_none());
    assert!(matches!(
        task_of(&result),
        Some(Task::SubmitScore { leaderboard, score: 5, .. }) if leaderboard == "lb"
    ));

    let result = session.increase_achievement("ach".into(), 3);
    assert!(matches!(
        task_of(&result),
        Some(Task::IncrementAchievement { steps: 3, .. })
    ));
}

#[test]
fn test_top_scores_convert_to_records() {
    let (mut session, epoch) = connected();

    let result = session.on_top_scores(epoch, "weekly", Ok(vec![score(1), score(2)]));
    match result.event {
        Some(BridgeEvent::ScoresLoaded(records)) => {
            assert_eq!(records.len(), 2);
            assert!(records.iter().all(|r| r.name == "weekly"));
            assert_eq!(records[1].rank, 2);
        }
        other => panic!("expected scores_loaded, got {other:?}"),
    }
}

#[test]
fn test_read_failures_are_silent() {
    let (mut session, epoch) = connected();
    assert!(session
        .on_top_scores(epoch, "weekly", Err("unknown".to_string()))
        .is_empty());
    assert!(session
        .on_player_score(epoch, "weekly", Err("unknown".to_string()))
        .is_empty());
}

#[test]
fn test_player_without_score_emits_nothing() {
    let (mut session, epoch) = connected();
    assert!(session.on_player_score(epoch, "weekly", Ok(None)).is_empty());

    let result = session.on_player_score(epoch, "weekly", Ok(Some(score(4))));
    assert!(matches!(result.event, Some(BridgeEvent::ScoreLoaded(ref r)) if r.rank == 4));
}

#[test]
fn test_presentation_intent_launches_under_surface() {
    let (mut session, epoch) = connected();

    let request = session.show(Surface::Leaderboard("weekly".into()));
    assert!(matches!(
        task_of(&request),
        Some(Task::FetchPresentationIntent { client, .. })
            if client.kind == playbridge_vendor::ClientKind::Leaderboards
    ));

    let result = session.on_presentation_intent(
        epoch,
        Surface::Leaderboard("weekly".into()),
        Ok(playbridge_vendor::Intent::new("games.SHOW_LEADERBOARD:weekly")),
    );
    let launch = launch_of(&result).expect("presentation launch");
    assert_eq!(
        launch.continuation,
        Continuation::Presentation(Surface::Leaderboard("weekly".into()))
    );
    assert!(result.event.is_none());
}

#[test]
fn test_presentation_intent_failure_is_logged_only() {
    let (mut session, epoch) = connected();
    let result = session.on_presentation_intent(
        epoch,
        Surface::Achievements,
        Err("intent unavailable".to_string()),
    );
    assert!(result.is_empty());
}

#[test]
fn test_record_requires_video_client() {
    let mut session = controller(IdentityScript {
        cached_account: Some("ada".to_string()),
        video_capture: false,
        ..Default::default()
    });
    session.initialize();
    assert!(session.is_connected());
    assert!(!session.can_record());
    assert!(session.record().is_empty());
}

#[test]
fn test_capture_intent_emits_recording_started_then_launches() {
    let (mut session, epoch) = connected();
    assert!(matches!(
        task_of(&session.record()),
        Some(Task::FetchCaptureIntent { .. })
    ));

    let result = session.on_capture_intent(
        epoch,
        Ok(playbridge_vendor::Intent::new("games.CAPTURE_OVERLAY")),
    );
    assert_eq!(result.event, Some(BridgeEvent::RecordingStarted));
    assert_eq!(
        launch_of(&result).map(|l| &l.continuation),
        Some(&Continuation::VideoCapture)
    );
}

#[test]
fn test_teardown_resets_to_uninitialized() {
    let (mut session, epoch) = connected();
    session.teardown();

    assert_eq!(session.phase(), SessionPhase::Uninitialized);
    assert!(!session.is_connected());
    assert!(session.on_top_scores(epoch, "lb", Ok(vec![score(1)])).is_empty());
    assert!(session.on_sign_out_completed(Ok(())).is_empty());
}

#[test]
fn test_is_connected_false_after_teardown_despite_cached_account() {
    let identity = Arc::new(SimIdentity::new(cached("ada")));
    let mut session = SessionController::new(Arc::clone(&identity), false);
    session.initialize();
    assert!(session.is_connected());

    session.teardown();

    // The vendor still remembers the account, but this session has not adopted it
    assert!(identity.last_signed_in_account().is_some());
    assert!(!session.is_connected());

    // Initializing again adopts it
    let result = session.initialize();
    assert_eq!(result.event, Some(BridgeEvent::SignedIn));
    assert!(session.is_connected());
}

#[test]
fn test_is_connected_false_when_vendor_drops_account() {
    let identity = Arc::new(SimIdentity::new(cached("ada")));
    let mut session = SessionController::new(Arc::clone(&identity), false);
    session.initialize();

    // Vendor-side sign-out that has not reached the session yet
    identity.forget_account();
    assert_eq!(session.phase(), SessionPhase::Connected);
    assert!(!session.is_connected());
}
