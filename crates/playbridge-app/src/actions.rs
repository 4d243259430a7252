//! Action handlers: foreground launches and vendor task execution
//!
//! Launches are synchronous and happen on the serialized context, after the
//! continuation is registered with the router. Vendor operations are spawned
//! onto the engine's `JoinSet` and post their completion back as a
//! [`Message`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use playbridge_core::prelude::*;
use playbridge_vendor::{HostActivity, IdentityPlatform, UpdatePlatform};

use crate::handler::{LaunchRequest, LaunchTarget, Task, UpdateAction};
use crate::message::Message;
use crate::router::{ResultRouter, Surface};

/// Vendor and host collaborators shared by all actions
pub struct Services<I, U, H> {
    pub identity: Arc<I>,
    pub updates: Arc<U>,
    pub host: Arc<H>,
}

impl<I, U, H> Clone for Services<I, U, H> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            updates: Arc::clone(&self.updates),
            host: Arc::clone(&self.host),
        }
    }
}

/// Execute an action. Returns a follow-up message to process immediately.
pub fn handle_action<I, U, H>(
    action: UpdateAction,
    router: &mut ResultRouter,
    services: &Services<I, U, H>,
    msg_tx: &mpsc::Sender<Message>,
    tasks: &mut JoinSet<()>,
) -> Option<Message>
where
    I: IdentityPlatform + Send + Sync + 'static,
    U: UpdatePlatform + Send + Sync + 'static,
    H: HostActivity + 'static,
{
    match action {
        UpdateAction::SpawnTask(task) => {
            let identity = Arc::clone(&services.identity);
            let updates = Arc::clone(&services.updates);
            let msg_tx = msg_tx.clone();
            tasks.spawn(execute_task(task, identity, updates, msg_tx));
            None
        }

        UpdateAction::Launch(request) => launch(request, router, services),

        UpdateAction::RegisterInstallListener => {
            let msg_tx = msg_tx.clone();
            let id = services.updates.register_listener(Box::new(move |install| {
                // Runs on a vendor thread
                if let Err(e) = msg_tx.try_send(Message::InstallStateChanged(install)) {
                    warn!("Dropped install state {:?}: {}", install.status, e);
                }
            }));
            Some(Message::InstallListenerRegistered(id))
        }

        UpdateAction::UnregisterInstallListener(id) => {
            services.updates.unregister_listener(id);
            debug!("Unregistered install-state listener {:?}", id);
            None
        }
    }
}

/// Register the continuation, then launch. A rejected launch withdraws the
/// registration and reports back as [`Message::LaunchFailed`].
fn launch<I, U, H>(
    request: LaunchRequest,
    router: &mut ResultRouter,
    services: &Services<I, U, H>,
) -> Option<Message>
where
    U: UpdatePlatform,
    H: HostActivity,
{
    let LaunchRequest {
        target,
        continuation,
    } = request;
    let code = router.register(continuation.clone());

    let launched = match &target {
        LaunchTarget::Intent(intent) => services.host.launch_intent(intent, code.code()),
        LaunchTarget::Resolution(resolution) => {
            services.host.launch_resolution(resolution, code.code())
        }
        LaunchTarget::UpdateFlow { info, options } => {
            services
                .updates
                .start_update_flow(info, *options, code.code())
        }
    };

    match launched {
        Ok(()) => {
            debug!("Launched {:?} under {}", continuation, code);
            None
        }
        Err(e) => {
            router.cancel(code);
            warn!("Launch under {} failed: {}", code, e);
            Some(Message::LaunchFailed {
                continuation,
                reason: e.to_string(),
            })
        }
    }
}

/// Run one vendor operation and post its completion
async fn execute_task<I, U>(
    task: Task,
    identity: Arc<I>,
    updates: Arc<U>,
    msg_tx: mpsc::Sender<Message>,
) where
    I: IdentityPlatform + Send + Sync + 'static,
    U: UpdatePlatform + Send + Sync + 'static,
{
    let message = match task {
        Task::SilentSignIn { epoch } => Some(Message::SilentSignInCompleted {
            epoch,
            result: identity.silent_sign_in().await.map_err(|e| e.to_string()),
        }),

        Task::SignOut => Some(Message::SignOutCompleted {
            result: identity.sign_out().await.map_err(|e| e.to_string()),
        }),

        Task::FetchPlayer { epoch, players } => Some(Message::PlayerLoaded {
            epoch,
            result: identity
                .current_player(&players)
                .await
                .map_err(|e| e.to_string()),
        }),

        Task::IncrementAchievement {
            achievements,
            achievement,
            steps,
        } => {
            if let Err(e) = identity
                .increment_achievement(&achievements, &achievement, steps)
                .await
            {
                warn!("increment_achievement({}) failed: {}", achievement, e);
            }
            None
        }

        Task::UnlockAchievement {
            achievements,
            achievement,
        } => {
            if let Err(e) = identity.unlock_achievement(&achievements, &achievement).await {
                warn!("unlock_achievement({}) failed: {}", achievement, e);
            }
            None
        }

        Task::SubmitScore {
            leaderboards,
            leaderboard,
            score,
        } => {
            if let Err(e) = identity.submit_score(&leaderboards, &leaderboard, score).await {
                warn!("submit_score({}) failed: {}", leaderboard, e);
            }
            None
        }

        Task::LoadTopScores {
            epoch,
            leaderboards,
            leaderboard,
            max,
        } => {
            let result = identity
                .load_top_scores(&leaderboards, &leaderboard, max)
                .await
                .map_err(|e| e.to_string());
            Some(Message::TopScoresLoaded {
                epoch,
                leaderboard,
                result,
            })
        }

        Task::LoadPlayerScore {
            epoch,
            leaderboards,
            leaderboard,
        } => {
            let result = identity
                .load_current_player_score(&leaderboards, &leaderboard)
                .await
                .map_err(|e| e.to_string());
            Some(Message::PlayerScoreLoaded {
                epoch,
                leaderboard,
                result,
            })
        }

        Task::FetchPresentationIntent {
            epoch,
            client,
            surface,
        } => {
            let result = match &surface {
                Surface::Achievements => identity.achievements_intent(&client).await,
                Surface::Leaderboard(leaderboard) => {
                    identity.leaderboard_intent(&client, leaderboard).await
                }
                Surface::AllLeaderboards => {
                    identity.all_leaderboards_intent(&client).await
                }
            };
            Some(Message::PresentationIntentReady {
                epoch,
                surface,
                result: result.map_err(|e| e.to_string()),
            })
        }

        Task::FetchCaptureIntent { epoch, videos } => Some(Message::CaptureIntentReady {
            epoch,
            result: identity
                .capture_overlay_intent(&videos)
                .await
                .map_err(|e| e.to_string()),
        }),

        Task::QueryUpdateInfo { query } => Some(Message::UpdateInfoLoaded {
            query,
            result: updates.app_update_info().await.map_err(|e| e.to_string()),
        }),

        Task::CompleteUpdate => {
            if let Err(e) = updates.complete_update().await {
                warn!("complete_update failed: {}", e);
            }
            None
        }
    };

    if let Some(message) = message {
        if msg_tx.send(message).await.is_err() {
            debug!("Engine dropped; vendor completion discarded");
        }
    }
}
