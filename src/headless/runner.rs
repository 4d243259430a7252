//! Headless runner - replays a scenario against the vendor simulator
//!
//! Each step is applied to the engine, then the engine is settled so every
//! vendor completion the step triggered has been processed before the next
//! step runs. Events are tagged with the index of the step that caused them.

use std::sync::Arc;

use playbridge_app::{BridgeSettings, Engine, EventReceiver};
use playbridge_core::prelude::*;
use playbridge_core::UpdateMode;
use playbridge_vendor::sim::{SimHost, SimIdentity, SimUpdates};
use playbridge_vendor::{ActivityPayload, InstallState};

use super::scenario::{Scenario, Step};
use super::HeadlessEvent;

type SimEngine = Engine<SimIdentity, SimUpdates, SimHost>;

/// Simulator handles the steps poke at directly
struct Simulator {
    updates: Arc<SimUpdates>,
    host: Arc<SimHost>,
}

/// Run a scenario and collect every event it produced
pub async fn run_scenario(scenario: &Scenario, settings: BridgeSettings) -> Vec<HeadlessEvent> {
    let mut collected = Vec::new();
    run_scenario_with(scenario, settings, |event| collected.push(event)).await;
    collected
}

/// Run a scenario, handing each event to `sink` as soon as its step settles
pub async fn run_scenario_with<F>(scenario: &Scenario, settings: BridgeSettings, mut sink: F)
where
    F: FnMut(HeadlessEvent),
{
    info!("═══════════════════════════════════════════════════════");
    info!("Running scenario: {}", scenario.display_name());
    info!("Steps: {}", scenario.steps.len());
    info!("═══════════════════════════════════════════════════════");

    let identity = Arc::new(SimIdentity::new(scenario.identity.clone()));
    let sim = Simulator {
        updates: Arc::new(SimUpdates::new(scenario.update.clone())),
        host: Arc::new(SimHost::new()),
    };
    let (mut engine, mut events) = Engine::new(
        identity,
        Arc::clone(&sim.updates),
        Arc::clone(&sim.host),
        settings,
    );

    let mut emitted = 0usize;
    for (index, step) in scenario.steps.iter().enumerate() {
        debug!("Step {}: {:?}", index, step);
        apply_step(&mut engine, &sim, step);
        engine.settle().await;
        emitted += forward(&mut events, index, &mut sink);
    }

    engine.shutdown();
    let leftover = forward(&mut events, scenario.steps.len(), &mut sink);
    if leftover > 0 {
        warn!("{} event(s) emitted during shutdown", leftover);
    }

    info!(
        "Scenario finished: {} step(s), {} event(s)",
        scenario.steps.len(),
        emitted + leftover
    );
}

fn forward<F>(events: &mut EventReceiver, step: usize, sink: &mut F) -> usize
where
    F: FnMut(HeadlessEvent),
{
    let drained = events.drain();
    let count = drained.len();
    for event in &drained {
        sink(HeadlessEvent::from_bridge(event, step));
    }
    count
}

fn apply_step(engine: &mut SimEngine, sim: &Simulator, step: &Step) {
    match step {
        Step::Initialize => engine.initialize(),
        Step::SignIn => engine.sign_in(),
        Step::SignOut => engine.sign_out(),
        Step::IncreaseAchievement { achievement, steps } => {
            engine.increase_achievement(achievement, *steps)
        }
        Step::UnlockAchievement { achievement } => engine.unlock_achievement(achievement),
        Step::SubmitScore { leaderboard, score } => engine.submit_score(leaderboard, *score),
        Step::LoadTopScore { leaderboard, max } => engine.load_top_score(leaderboard, *max),
        Step::LoadCurrentPlayerScore { leaderboard } => {
            engine.load_current_player_score(leaderboard)
        }
        Step::ShowAchievements => engine.show_achievements(),
        Step::ShowLeaderboard { leaderboard } => engine.show_leaderboard(leaderboard),
        Step::ShowAllLeaderboards => engine.show_all_leaderboards(),
        Step::Record => engine.record(),
        Step::StartCheck { params } => engine.start_check_with_params(params),
        Step::StartUpdate {
            mode,
            allow_asset_pack_deletion,
        } => match mode {
            UpdateMode::Immediate => engine.start_update_immediate(*allow_asset_pack_deletion),
            UpdateMode::Flexible => engine.start_update_flexible(*allow_asset_pack_deletion),
        },
        Step::CompleteUpdate => engine.complete_update(),
        Step::ActivityResult {
            request_code,
            result_code,
            payload,
        } => engine.on_activity_result(
            *request_code,
            *result_code,
            payload.clone().map(ActivityPayload),
        ),
        Step::Resume => engine.on_resume(),
        Step::Teardown => engine.shutdown(),
        Step::PushInstallState { status } => {
            sim.updates.push_install_state(InstallState::new(*status))
        }
        Step::SetUpdateInfo { info } => sim.updates.set_info(info.clone()),
        Step::FailNextLaunches { count } => sim.host.fail_next_launches(*count),
    }
}
