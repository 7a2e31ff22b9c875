//! Async session facade.
//!
//! One tokio mutex serializes every writer. The lock is released while the
//! arm works, so status polls and an operator abort are never stuck behind a
//! slow actuator; a second submit during that window meets the
//! `AwaitingActuation` phase and is refused. Readers use the `watch` channel,
//! which always holds the status published after the last change.

use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use crate::actuation::command_dispatcher::{AbortHandle, CommandDispatcher, PendingActuation};
use crate::coordinator::game_clock::GameClock;
use crate::coordinator::turn_coordinator::{MoveReport, SessionStatus, SubmitOutcome, TurnCoordinator};
use crate::coordinator::turn_phase::TurnPhase;
use crate::errors::CoordinatorError;
use crate::game_state::board_state::BoardState;
use crate::game_state::chess_types::Color;
use crate::game_state::game_status::GameResult;
use crate::moves::chess_move::Move;
use crate::persistence::snapshot::{GameSnapshot, SnapshotStore};

enum Submitted {
    Applied(MoveReport),
    Dispatched(PendingActuation),
}

pub struct GameSession {
    coordinator: Mutex<TurnCoordinator>,
    dispatcher: CommandDispatcher,
    ack_timeout: Duration,
    status: watch::Sender<SessionStatus>,
    in_flight: StdMutex<Option<AbortHandle>>,
    snapshots: Option<SnapshotStore>,
    autosave: bool,
}

impl GameSession {
    pub fn new(coordinator: TurnCoordinator, dispatcher: CommandDispatcher, ack_timeout: Duration) -> Self {
        let (status, _) = watch::channel(coordinator.status());
        Self {
            coordinator: Mutex::new(coordinator),
            dispatcher,
            ack_timeout,
            status,
            in_flight: StdMutex::new(None),
            snapshots: None,
            autosave: false,
        }
    }

    /// Attach a snapshot file; with `autosave` every state change is written.
    pub fn with_snapshots(mut self, store: SnapshotStore, autosave: bool) -> Self {
        self.snapshots = Some(store);
        self.autosave = autosave;
        self
    }

    /// Latest published status. Never waits for the writer lock.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Run a move through the whole turn: validation, then, when the policy
    /// wants the arm, dispatch and acknowledgement before the commit.
    pub async fn submit_move(&self, mv: Move) -> Result<MoveReport, CoordinatorError> {
        self.submit(None, mv).await
    }

    pub async fn submit_move_for(&self, side: Color, mv: Move) -> Result<MoveReport, CoordinatorError> {
        self.submit(Some(side), mv).await
    }

    async fn submit(&self, side: Option<Color>, mv: Move) -> Result<MoveReport, CoordinatorError> {
        // Dispatch under the writer lock so the abort handle is in place
        // before any other writer can observe `AwaitingActuation`.
        let pending = match self
            .write(|coordinator| {
                let outcome = match side {
                    Some(side) => coordinator.submit_move_for(side, mv)?,
                    None => coordinator.submit_move(mv)?,
                };
                Ok(match outcome {
                    SubmitOutcome::Applied(report) => Submitted::Applied(report),
                    SubmitOutcome::AwaitingActuation(command) => {
                        let pending = self.dispatcher.dispatch(command);
                        self.set_in_flight(Some(pending.abort_handle()));
                        Submitted::Dispatched(pending)
                    }
                })
            })
            .await?
        {
            Submitted::Dispatched(pending) => pending,
            Submitted::Applied(report) => return Ok(report),
        };

        let outcome = self.dispatcher.await_ack(pending, self.ack_timeout).await;

        self.write(|coordinator| {
            self.set_in_flight(None);
            let report = coordinator.on_actuation_ack(outcome)?;
            coordinator.on_actuation_complete()?;
            Ok(report)
        })
        .await
    }

    /// Abort the command the arm is executing. The outcome is settled by the
    /// acknowledgement of that command: an arm that already finished still
    /// commits its move. Without a live dispatch (e.g. after a restore) the
    /// coordinator is moved to `Error` directly.
    pub async fn abort(&self) -> Result<(), CoordinatorError> {
        self.write(|coordinator| {
            if let Some(handle) = self.in_flight_handle() {
                info!(command_id = handle.command_id(), "operator abort requested");
                handle.abort();
                return Ok(());
            }
            coordinator.abort_actuation()
        })
        .await
    }

    pub async fn operator_reset(&self) -> Result<(), CoordinatorError> {
        self.write(TurnCoordinator::operator_reset).await
    }

    pub async fn new_game(&self, fen: Option<&str>) -> Result<(), CoordinatorError> {
        self.write(|coordinator| coordinator.new_game(fen)).await
    }

    pub async fn resign(&self, side: Color) -> Result<GameResult, CoordinatorError> {
        self.write(|coordinator| coordinator.resign(side)).await
    }

    pub async fn offer_draw(&self, side: Color) -> Result<Option<GameResult>, CoordinatorError> {
        self.write(|coordinator| coordinator.offer_draw(side)).await
    }

    pub async fn respond_draw(&self, side: Color, accept: bool) -> Result<Option<GameResult>, CoordinatorError> {
        self.write(|coordinator| coordinator.respond_draw(side, accept)).await
    }

    pub async fn take_back(&self) -> Result<Move, CoordinatorError> {
        self.write(TurnCoordinator::take_back).await
    }

    /// End the game on time if the side to move has run out. Status is only
    /// republished when the flag fell.
    pub async fn check_clock(&self) -> Option<GameResult> {
        let mut coordinator = self.coordinator.lock().await;
        let result = coordinator.check_clock()?;
        self.publish(&coordinator).await;
        Some(result)
    }

    pub async fn clock(&self) -> Option<GameClock> {
        self.coordinator.lock().await.settled_clock()
    }

    pub async fn legal_moves(&self) -> Vec<Move> {
        self.coordinator.lock().await.legal_moves()
    }

    pub async fn pgn(&self) -> String {
        self.coordinator.lock().await.pgn()
    }

    pub async fn board(&self) -> BoardState {
        *self.coordinator.lock().await.game().board()
    }

    /// Write the current session to the configured snapshot file.
    pub async fn save_snapshot(&self) -> Result<(), CoordinatorError> {
        let store = self.snapshot_store()?;
        let snapshot = GameSnapshot::capture(&*self.coordinator.lock().await);
        store.save(&snapshot).await?;
        Ok(())
    }

    /// Replace the session with the one stored in the snapshot file. Returns
    /// `false` when there is no snapshot yet.
    pub async fn load_snapshot(&self) -> Result<bool, CoordinatorError> {
        let store = self.snapshot_store()?;
        let mut coordinator = self.coordinator.lock().await;
        if coordinator.phase() == TurnPhase::AwaitingActuation {
            return Err(CoordinatorError::WrongPhase {
                operation: "load_snapshot",
                phase: coordinator.phase(),
            });
        }

        let Some(snapshot) = store.load().await? else {
            return Ok(false);
        };
        *coordinator = snapshot.restore(coordinator.policy())?;
        self.status.send_replace(coordinator.status());
        info!(fen = %snapshot.fen, phase = %coordinator.phase(), "session restored from snapshot");
        Ok(true)
    }

    fn snapshot_store(&self) -> Result<&SnapshotStore, CoordinatorError> {
        self.snapshots
            .as_ref()
            .ok_or_else(|| CoordinatorError::Snapshot("no snapshot file configured".to_owned()))
    }

    fn in_flight_handle(&self) -> Option<AbortHandle> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_in_flight(&self, handle: Option<AbortHandle>) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = handle;
    }

    /// Apply `op` under the writer lock, then publish the new status whether
    /// or not `op` succeeded.
    async fn write<T>(
        &self,
        op: impl FnOnce(&mut TurnCoordinator) -> Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        let mut coordinator = self.coordinator.lock().await;
        let result = op(&mut coordinator);
        self.publish(&coordinator).await;
        result
    }

    async fn publish(&self, coordinator: &TurnCoordinator) {
        self.status.send_replace(coordinator.status());

        if !self.autosave {
            return;
        }
        if let Some(store) = &self.snapshots {
            if let Err(err) = store.save(&GameSnapshot::capture(coordinator)).await {
                error!(error = %err, path = %store.path().display(), "autosave failed");
            }
        }
    }
}
