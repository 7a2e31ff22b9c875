//! Canonical chess-rule constants.
//!
//! Static rule literals: the standard starting FEN, draw thresholds and the
//! fixed castling geometry shared by validation, move application and the arm
//! command builder.

use crate::game_state::chess_types::{Color, Square};

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-moves without a capture or pawn move before the fifty-move draw.
pub const FIFTY_MOVE_HALFMOVES: u16 = 100;

/// Occurrences of one position that make a repetition draw.
pub const REPETITION_DRAW_COUNT: usize = 3;

/// King and rook squares for one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastleGeometry {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares between king and rook that must be empty.
    pub must_be_empty: u64,
    /// Squares the king crosses or lands on; none may be attacked.
    pub king_path: [Square; 2],
}

const LIGHT_KINGSIDE: CastleGeometry = CastleGeometry {
    king_from: 4,
    king_to: 6,
    rook_from: 7,
    rook_to: 5,
    must_be_empty: (1u64 << 5) | (1u64 << 6),
    king_path: [5, 6],
};

const LIGHT_QUEENSIDE: CastleGeometry = CastleGeometry {
    king_from: 4,
    king_to: 2,
    rook_from: 0,
    rook_to: 3,
    must_be_empty: (1u64 << 1) | (1u64 << 2) | (1u64 << 3),
    king_path: [3, 2],
};

const DARK_KINGSIDE: CastleGeometry = CastleGeometry {
    king_from: 60,
    king_to: 62,
    rook_from: 63,
    rook_to: 61,
    must_be_empty: (1u64 << 61) | (1u64 << 62),
    king_path: [61, 62],
};

const DARK_QUEENSIDE: CastleGeometry = CastleGeometry {
    king_from: 60,
    king_to: 58,
    rook_from: 56,
    rook_to: 59,
    must_be_empty: (1u64 << 57) | (1u64 << 58) | (1u64 << 59),
    king_path: [59, 58],
};

#[inline]
pub const fn castle_geometry(color: Color, kingside: bool) -> CastleGeometry {
    match (color, kingside) {
        (Color::Light, true) => LIGHT_KINGSIDE,
        (Color::Light, false) => LIGHT_QUEENSIDE,
        (Color::Dark, true) => DARK_KINGSIDE,
        (Color::Dark, false) => DARK_QUEENSIDE,
    }
}

/// Geometry for a king move `from -> to`, if it is one of the four castles.
pub fn castle_geometry_for(color: Color, from: Square, to: Square) -> Option<CastleGeometry> {
    [true, false]
        .into_iter()
        .map(|kingside| castle_geometry(color, kingside))
        .find(|geometry| geometry.king_from == from && geometry.king_to == to)
}
