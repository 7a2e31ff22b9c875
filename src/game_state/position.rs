//! Flat 64-cell board.
//!
//! `Position` is the canonical piece placement. Occupancy bitboards for the
//! attack tables are derived on demand through `Position::masks`, so the board
//! itself stays a plain tagged array that is cheap to copy when validation
//! simulates a move.

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::game_state::chess_types::*;
use crate::utils::fen_generator::generate_placement_field;
use crate::utils::fen_parser::parse_placement_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    cells: [Option<Piece>; 64],
}

/// Bitboards derived from a `Position`: `[color][piece_kind]` plus occupancy caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccupancyMasks {
    pub pieces: [[u64; 6]; 2],
    pub by_color: [u64; 2],
    pub all: u64,
}

impl OccupancyMasks {
    #[inline]
    pub fn of(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::empty()
    }
}

impl Position {
    pub const fn empty() -> Self {
        Self { cells: [None; 64] }
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells.get(square as usize).copied().flatten()
    }

    /// Put `piece` (or nothing) on `square`, returning what was there.
    #[inline]
    pub fn set(&mut self, square: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.cells[square as usize], piece)
    }

    #[inline]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.set(square, None)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(sq, cell)| cell.map(|piece| (sq as Square, piece)))
    }

    pub fn masks(&self) -> OccupancyMasks {
        let mut masks = OccupancyMasks::default();
        for (sq, piece) in self.iter() {
            let bit = 1u64 << sq;
            masks.pieces[piece.color.index()][piece.kind.index()] |= bit;
            masks.by_color[piece.color.index()] |= bit;
            masks.all |= bit;
        }
        masks
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.iter()
            .find(|(_, piece)| *piece == king)
            .map(|(sq, _)| sq)
    }

    pub fn count(&self, color: Color, kind: PieceKind) -> u32 {
        let wanted = Piece::new(color, kind);
        self.iter().filter(|(_, piece)| *piece == wanted).count() as u32
    }

    /// FEN piece-placement field, e.g. `rnbqkbnr/pppppppp/8/...`.
    pub fn placement_field(&self) -> String {
        generate_placement_field(self)
    }

    pub fn from_placement_field(field: &str) -> Result<Self, ParseError> {
        parse_placement_field(field)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.placement_field()
    }
}

impl TryFrom<String> for Position {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Position::from_placement_field(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::{Color, Piece, PieceKind};

    fn start() -> Position {
        let field = STARTING_POSITION_FEN
            .split_whitespace()
            .next()
            .expect("start FEN has a placement field");
        Position::from_placement_field(field).expect("start placement should parse")
    }

    #[test]
    fn start_masks_match_piece_counts() {
        let position = start();
        let masks = position.masks();
        assert_eq!(masks.all.count_ones(), 32);
        assert_eq!(masks.by_color[Color::Light.index()], 0xFFFF);
        assert_eq!(masks.of(Color::Dark, PieceKind::Pawn), 0x00FF_0000_0000_0000);
        assert_eq!(position.king_square(Color::Light), Some(4));
        assert_eq!(position.king_square(Color::Dark), Some(60));
    }

    #[test]
    fn set_returns_previous_occupant() {
        let mut position = Position::empty();
        let rook = Piece::new(Color::Dark, PieceKind::Rook);
        assert_eq!(position.set(27, Some(rook)), None);
        assert_eq!(position.take(27), Some(rook));
        assert_eq!(position.piece_at(27), None);
    }

    #[test]
    fn serializes_as_placement_field() {
        let position = start();
        let json = serde_json::to_string(&position).expect("position should serialize");
        assert_eq!(json, "\"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR\"");
        let back: Position = serde_json::from_str(&json).expect("position should deserialize");
        assert_eq!(back, position);
    }
}
