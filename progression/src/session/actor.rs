use std::ops::ControlFlow;

use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::Instrument;

use super::commands::{LevelCommand, SessionError};
use super::events::LevelEvent;
use super::snapshot::LevelSnapshot;
use super::state::LevelSessionState;
use crate::persistence::GameRepository;

/// Regeneration timers are checked once a second.
const TICK: time::Duration = time::Duration::from_secs(1);

/// The main level session loop.
/// Owns all mutable state. Processes commands and timer ticks sequentially.
pub(crate) async fn run_level_actor<R: GameRepository + 'static>(
    state: LevelSessionState<R>,
    cmd_rx: mpsc::Receiver<LevelCommand>,
    event_tx: broadcast::Sender<LevelEvent>,
) {
    let session_id = state.session_id.clone();
    let level_id = state.level_id();
    run_level_actor_inner(state, cmd_rx, event_tx)
        .instrument(tracing::info_span!("level_session", id = %session_id, level_id))
        .await;
}

async fn run_level_actor_inner<R: GameRepository + 'static>(
    mut state: LevelSessionState<R>,
    mut cmd_rx: mpsc::Receiver<LevelCommand>,
    event_tx: broadcast::Sender<LevelEvent>,
) {
    tracing::info!("Level session started");

    let mut regen_interval = time::interval(TICK);
    regen_interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    tracing::info!("All handles dropped");
                    break;
                };
                if handle_command(&mut state, cmd, &event_tx).await.is_break() {
                    break;
                }
            }

            _ = regen_interval.tick(), if state.timer_active() => {
                match state.tick().await {
                    Ok(true) => {
                        let _ = event_tx.send(LevelEvent::StateChanged(state.snapshot()));
                    }
                    Ok(false) => {}
                    Err(e) => broadcast_failure(&state, &e, &event_tx),
                }
            }
        }
    }

    tracing::info!("Level session exited");
}

async fn handle_command<R: GameRepository>(
    state: &mut LevelSessionState<R>,
    cmd: LevelCommand,
    event_tx: &broadcast::Sender<LevelEvent>,
) -> ControlFlow<()> {
    let (result, reply) = match cmd {
        LevelCommand::SelectTile { tile, reply } => (state.select_tile(tile).await, reply),
        LevelCommand::DeleteLast { reply } => (state.delete_last().await, reply),
        LevelCommand::ClearAll { reply } => (state.clear_all().await, reply),
        LevelCommand::UseHint { kind, reply } => (state.use_hint(kind).await, reply),
        LevelCommand::Pause { reply } => (state.pause().await, reply),
        LevelCommand::Resume { reply } => (state.resume().await, reply),
        LevelCommand::Restart { reply } => (state.restart().await, reply),
        LevelCommand::RefillLives { reply } => (state.refill_lives().await, reply),
        LevelCommand::AdResult { outcome, reply } => (state.on_ad_result(outcome).await, reply),
        LevelCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
            return ControlFlow::Continue(());
        }
        LevelCommand::Subscribe { reply } => {
            let _ = reply.send((state.snapshot(), event_tx.subscribe()));
            return ControlFlow::Continue(());
        }
        LevelCommand::Shutdown => {
            tracing::info!("Level session shutting down");
            return ControlFlow::Break(());
        }
    };

    match &result {
        Ok(snapshot) => publish(snapshot, event_tx),
        Err(e) => broadcast_failure(state, e, event_tx),
    }
    let _ = reply.send(result);
    ControlFlow::Continue(())
}

fn publish(snapshot: &LevelSnapshot, event_tx: &broadcast::Sender<LevelEvent>) {
    let _ = event_tx.send(LevelEvent::StateChanged(snapshot.clone()));
    if snapshot.is_solved() && snapshot.completion.is_some() {
        let _ = event_tx.send(LevelEvent::Completed(snapshot.clone()));
    }
}

fn broadcast_failure<R: GameRepository>(
    state: &LevelSessionState<R>,
    err: &SessionError,
    event_tx: &broadcast::Sender<LevelEvent>,
) {
    match err {
        SessionError::Persistence(msg) => {
            tracing::error!("Level session storage failure: {msg}");
            let _ = event_tx.send(LevelEvent::Error(msg.clone()));
            let _ = event_tx.send(LevelEvent::StateChanged(state.snapshot()));
        }
        SessionError::InsufficientCoins { .. } | SessionError::NothingToRemove => {
            let _ = event_tx.send(LevelEvent::StateChanged(state.snapshot()));
        }
        _ => tracing::debug!("Command rejected: {err}"),
    }
}
