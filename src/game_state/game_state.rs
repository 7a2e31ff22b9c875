//! Board State Store.
//!
//! `GameState` is the canonical record of one game: the current `BoardState`,
//! the FEN it started from, the append-only move history and the position key
//! of every position reached. It changes only through `apply_move`, which
//! accepts nothing but a `LegalMove` validated against this exact state while
//! the turn machine is in a phase that permits committing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinator::turn_phase::TurnPhase;
use crate::errors::{IllegalStateError, InvariantViolation, ParseError, ReplayError};
use crate::game_state::chess_rules::{FIFTY_MOVE_HALFMOVES, REPETITION_DRAW_COUNT};
use crate::game_state::chess_types::*;
use crate::game_state::game_status::TerminalStatus;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::has_any_legal_move;
use crate::move_generation::move_validator::{validate, LegalMove};
use crate::moves::chess_move::Move;

/// One applied ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub mv: Move,
    pub moved: Piece,
    pub captured: Option<Piece>,
    pub lan: String,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) board: BoardState,
    pub(crate) initial_fen: String,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) position_keys: Vec<u64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new_game()
    }
}

impl GameState {
    pub fn new_game() -> Self {
        Self::from_board(BoardState::start())
    }

    /// Start a game from an arbitrary position. The position must satisfy the
    /// structural invariants of a legal game.
    pub fn from_fen(fen: &str) -> Result<Self, ParseError> {
        let game = Self::from_board(BoardState::from_fen(fen)?);
        game.verify_invariants()
            .map_err(|violation| ParseError::Fen(violation.to_string()))?;
        Ok(game)
    }

    fn from_board(board: BoardState) -> Self {
        Self {
            initial_fen: board.to_fen(),
            position_keys: vec![board.key()],
            history: Vec::new(),
            board,
        }
    }

    /// Commit an approved move and return the resulting state.
    ///
    /// Fails when the turn phase does not permit committing a move, or when
    /// `legal` was validated against some other state.
    pub fn apply_move(&self, phase: TurnPhase, legal: &LegalMove) -> Result<Self, IllegalStateError> {
        if !phase.permits_apply() {
            return Err(IllegalStateError::PhaseNotApproved(phase));
        }
        if legal.validated_key() != self.key() {
            return Err(IllegalStateError::StaleMove);
        }
        Ok(self.committed(legal, Utc::now()))
    }

    fn committed(&self, legal: &LegalMove, played_at: DateTime<Utc>) -> Self {
        let board = *legal.board_after();
        let mut next = self.clone();
        next.history.push(HistoryEntry {
            mv: legal.mv(),
            moved: legal.moved(),
            captured: legal.captured().map(|(_, piece)| piece),
            lan: legal.mv().to_lan(),
            played_at,
        });
        next.position_keys.push(board.key());
        next.board = board;
        next
    }

    /// Read-only copy of the piece placement.
    #[inline]
    pub fn current_position(&self) -> Position {
        self.board.position
    }

    #[inline]
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    #[inline]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[inline]
    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        self.board.to_fen()
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.position_keys.last().copied().unwrap_or_else(|| self.board.key())
    }

    /// Moves played so far, oldest first.
    pub fn moves(&self) -> Vec<Move> {
        self.history.iter().map(|entry| entry.mv).collect()
    }

    pub fn is_in_check(&self) -> bool {
        is_king_in_check(&self.board.position, self.board.side_to_move)
    }

    /// How many times the current position has occurred, this one included.
    pub fn repetition_count(&self) -> usize {
        let current = self.key();
        self.position_keys.iter().filter(|&&key| key == current).count()
    }

    pub fn is_terminal(&self) -> TerminalStatus {
        if !has_any_legal_move(&self.board) {
            return if self.is_in_check() {
                TerminalStatus::Checkmate {
                    winner: self.board.side_to_move.opposite(),
                }
            } else {
                TerminalStatus::Stalemate
            };
        }
        if self.has_insufficient_material() {
            return TerminalStatus::DrawByInsufficientMaterial;
        }
        if self.board.halfmove_clock >= FIFTY_MOVE_HALFMOVES {
            return TerminalStatus::DrawByFiftyMove;
        }
        if self.repetition_count() >= REPETITION_DRAW_COUNT {
            return TerminalStatus::DrawByRepetition;
        }
        TerminalStatus::None
    }

    /// Neither side can mate: bare kings, a single minor piece, or bishops
    /// that all stand on squares of one color.
    fn has_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (sq, piece) in self.board.position.iter() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((sq, piece.kind)),
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            }
        }

        match minors.as_slice() {
            [] | [_] => true,
            _ => {
                let square_color = |sq: Square| (file_of(sq) + rank_of(sq)) % 2;
                minors.iter().all(|&(_, kind)| kind == PieceKind::Bishop)
                    && minors
                        .iter()
                        .all(|&(sq, _)| square_color(sq) == square_color(minors[0].0))
            }
        }
    }

    /// Structural checks that hold in every position of a legal game.
    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        for color in Color::ALL {
            let count = self.board.position.count(color, PieceKind::King);
            if count != 1 {
                return Err(InvariantViolation::KingCount { color, count });
            }
        }

        let back_ranks = self
            .board
            .position
            .iter()
            .find(|(sq, piece)| piece.kind == PieceKind::Pawn && (rank_of(*sq) == 0 || rank_of(*sq) == 7));
        if let Some((square, _)) = back_ranks {
            return Err(InvariantViolation::PawnOnBackRank { square });
        }

        Ok(())
    }

    /// Rebuild a game by validating and applying `moves` from `initial_fen`.
    pub fn replay(initial_fen: &str, moves: &[Move]) -> Result<Self, ReplayError> {
        let now = Utc::now();
        Self::replay_timed(initial_fen, moves.iter().map(|&mv| (mv, now)))
    }

    /// Like `replay`, keeping the recorded timestamps of each entry.
    pub fn replay_history(initial_fen: &str, entries: &[HistoryEntry]) -> Result<Self, ReplayError> {
        Self::replay_timed(initial_fen, entries.iter().map(|entry| (entry.mv, entry.played_at)))
    }

    fn replay_timed(
        initial_fen: &str,
        moves: impl IntoIterator<Item = (Move, DateTime<Utc>)>,
    ) -> Result<Self, ReplayError> {
        let mut game = Self::from_board(BoardState::from_fen(initial_fen)?);
        game.verify_invariants()?;

        for (ply, (mv, played_at)) in moves.into_iter().enumerate() {
            let legal = validate(&game, game.side_to_move(), mv).map_err(|reason| ReplayError::IllegalMove {
                ply: ply + 1,
                lan: mv.to_lan(),
                reason,
            })?;
            game = game.committed(&legal, played_at);
        }

        Ok(game)
    }

    /// The game as it was before the last ply, or `None` with an empty history.
    pub fn undo_last(&self) -> Option<Result<Self, ReplayError>> {
        let (_, earlier) = self.history.split_last()?;
        Some(Self::replay_history(&self.initial_fen, earlier))
    }
}
