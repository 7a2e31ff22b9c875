//! JSON snapshots of a session.
//!
//! A snapshot records the initial FEN and the full history; the current FEN
//! is stored alongside as a checksum. Restoring replays the history through
//! the validator and refuses a snapshot whose replay ends elsewhere.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coordinator::actuation_policy::ActuationPolicy;
use crate::coordinator::game_clock::GameClock;
use crate::coordinator::turn_coordinator::TurnCoordinator;
use crate::coordinator::turn_phase::TurnPhase;
use crate::errors::SnapshotError;
use crate::game_state::chess_types::Color;
use crate::game_state::game_state::{GameState, HistoryEntry};
use crate::game_state::game_status::GameResult;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub initial_fen: String,
    pub history: Vec<HistoryEntry>,
    pub fen: String,
    pub phase: TurnPhase,
    pub result: Option<GameResult>,
    pub draw_offer: Option<Color>,
    /// Absent for untimed games and for files written before time control.
    #[serde(default)]
    pub clock: Option<GameClock>,
}

impl GameSnapshot {
    pub fn capture(coordinator: &TurnCoordinator) -> Self {
        let game = coordinator.game();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            initial_fen: game.initial_fen().to_owned(),
            history: game.history().to_vec(),
            fen: game.to_fen(),
            phase: coordinator.phase(),
            result: coordinator.result(),
            draw_offer: coordinator.draw_offer(),
            clock: coordinator.settled_clock(),
        }
    }

    /// Replay the recorded history and rebuild a coordinator from it.
    pub fn restore(&self, policy: ActuationPolicy) -> Result<TurnCoordinator, SnapshotError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.format_version));
        }

        let game = GameState::replay_history(&self.initial_fen, &self.history)?;
        let replayed = game.to_fen();
        if replayed != self.fen {
            return Err(SnapshotError::FenMismatch {
                replayed,
                recorded: self.fen.clone(),
            });
        }
        game.verify_invariants()?;

        Ok(TurnCoordinator::restore(
            game,
            self.phase,
            self.result,
            self.draw_offer,
            self.clock,
            policy,
        ))
    }
}

/// Snapshot file on disk. Writes go to a sibling temp file that is renamed
/// over the target, so a crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), ply = snapshot.history.len(), "snapshot saved");
        Ok(())
    }

    /// `None` when no snapshot has been written yet.
    pub async fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot: GameSnapshot = serde_json::from_slice(&bytes)?;
        info!(path = %self.path.display(), ply = snapshot.history.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
