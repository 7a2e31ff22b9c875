//! Copyable board snapshot: placement plus the per-position rule facts.
//!
//! `BoardState` is everything FEN describes. Move generation and validation
//! work on it directly; `GameState` wraps it with history and repetition keys.

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::game_state::chess_types::*;
use crate::game_state::zobrist::compute_position_key;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardState {
    pub position: Position,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            position: Position::empty(),
            side_to_move: Color::Light,
            castling_rights: CastlingRights::NONE,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl BoardState {
    /// Standard initial setup (equivalent to `STARTING_POSITION_FEN`).
    pub fn start() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut position = Position::empty();
        for color in Color::ALL {
            for (file, kind) in BACK_RANK.into_iter().enumerate() {
                let file = file as u8;
                position.set(square_at(file, color.back_rank()), Some(Piece::new(color, kind)));
                position.set(
                    square_at(file, color.pawn_start_rank()),
                    Some(Piece::new(color, PieceKind::Pawn)),
                );
            }
        }

        Self {
            position,
            castling_rights: CastlingRights::ALL,
            ..Self::default()
        }
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, ParseError> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Zobrist key identifying this position for repetition checks.
    #[inline]
    pub fn key(&self) -> u64 {
        compute_position_key(self)
    }
}
