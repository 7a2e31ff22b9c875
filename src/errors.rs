//! Error types used throughout the coordination core.
//!
//! Errors are grouped by who can recover from them:
//! - `IllegalMoveReason` is returned to the mover, nothing is mutated.
//! - `ActuationFailure` leaves the game untouched and parks the turn machine in
//!   `Error` until an operator reset.
//! - `InvariantViolation` is fatal for the session; it is logged and the
//!   session must be discarded.
//! - `ParseError`, `SnapshotError`, `ConfigError`, `RegistryError` cover the
//!   text formats, persistence, configuration and board controllers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::turn_phase::{TransitionError, TurnPhase};
use crate::game_state::chess_types::{Color, Square};
use crate::game_state::game_status::GameResult;

/// Failure to parse FEN, square names, move text or PGN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid FEN: {0}")]
    Fen(String),
    #[error("invalid square '{0}'")]
    Square(String),
    #[error("invalid move '{text}': {reason}")]
    MoveText { text: String, reason: String },
    #[error("invalid PGN: {0}")]
    Pgn(String),
}

/// Why the validator rejected a proposed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMoveReason {
    /// The piece on the source cell belongs to the other side, or the mover
    /// is not the side to move.
    #[error("it is not this side's turn")]
    WrongSide,
    #[error("there is no piece on the source square")]
    NoPieceAtSource,
    /// The destination is outside the piece's movement pattern, is occupied
    /// by an own piece, or the path to it is obstructed.
    #[error("the piece cannot reach the destination square")]
    BlockedPath,
    #[error("the move would leave the king in check")]
    LeavesKingInCheck,
    #[error("castling is not allowed here")]
    InvalidCastle,
    #[error("en-passant capture is not allowed here")]
    InvalidEnPassant,
    #[error("invalid promotion choice")]
    InvalidPromotionChoice,
}

/// Misuse of the board store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalStateError {
    #[error("moves cannot be applied while the turn phase is {0}")]
    PhaseNotApproved(TurnPhase),
    #[error("the approved move was validated against a different position")]
    StaleMove,
    #[error("no piece on square {0} to move")]
    EmptySource(Square),
}

/// Structural corruption of a position. Never expected during a legal game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum InvariantViolation {
    #[error("{color} has {count} kings")]
    KingCount { color: Color, count: u32 },
    #[error("pawn on back rank square {square}")]
    PawnOnBackRank { square: Square },
}

/// Reported by the command dispatcher when the arm did not complete a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ActuationFailure {
    #[error("actuator did not acknowledge in time")]
    Timeout,
    #[error("actuator failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("actuator rejected the command: {0}")]
    Rejected(String),
    #[error("actuation aborted by operator")]
    Aborted,
    #[error("actuation task ended without reporting")]
    TaskLost,
}

/// Failure to rebuild a game by replaying its moves from the initial FEN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Fen(#[from] ParseError),
    #[error("move {ply} ({lan}) is illegal: {reason}")]
    IllegalMove {
        ply: usize,
        lan: String,
        reason: IllegalMoveReason,
    },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Everything the turn coordinator can refuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMoveReason),
    #[error("the game is over ({0})")]
    GameOver(GameResult),
    #[error("{operation} is not allowed while the turn phase is {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: TurnPhase,
    },
    #[error("an operator reset is required before continuing")]
    RequiresOperatorReset,
    #[error("actuation failed: {0}")]
    ActuationFailed(ActuationFailure),
    #[error("no actuation is in flight")]
    NoActuationInFlight,
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0} already has a pending draw offer")]
    DrawAlreadyOffered(Color),
    #[error("there is no draw offer for {0} to answer")]
    NoDrawOffer(Color),
    #[error("there is no move to take back")]
    NothingToTakeBack,
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Failure to persist or restore a game snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),
    #[error("snapshot failed verification: {0}")]
    Invalid(#[from] InvariantViolation),
    #[error("snapshot history cannot be replayed: {0}")]
    Replay(#[from] ReplayError),
    #[error("replayed history ends at {replayed}, snapshot recorded {recorded}")]
    FenMismatch { replayed: String, recorded: String },
}

impl From<SnapshotError> for CoordinatorError {
    fn from(err: SnapshotError) -> Self {
        CoordinatorError::Snapshot(err.to_string())
    }
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Board controller registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("controller {0} is already registered and active")]
    AlreadyActive(String),
    #[error("controller {0} was never registered")]
    UnknownController(String),
    #[error("controller {0} is not active")]
    NotActive(String),
}
