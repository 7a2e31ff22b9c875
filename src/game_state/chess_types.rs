/// Core value types shared by the board store, validator and coordinator.
/// Squares are plain indices where `0 == a1`, `7 == h1` and `63 == h8`.
use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::game_state::board_state::BoardState;
pub use crate::game_state::game_state::GameState;
pub use crate::game_state::position::Position;

/// Board square index (`0..=63`).
pub type Square = u8;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[serde(alias = "white", alias = "w")]
    Light,
    #[serde(alias = "black", alias = "b")]
    Dark,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Rank (`0..=7`) holding this side's king and rooks at the start.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::Light => 0,
            Color::Dark => 7,
        }
    }

    #[inline]
    pub const fn pawn_start_rank(self) -> u8 {
        match self {
            Color::Light => 1,
            Color::Dark => 6,
        }
    }

    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        self.opposite().back_rank()
    }

    /// Single-step pawn direction expressed as a square offset.
    #[inline]
    pub const fn pawn_step(self) -> i8 {
        match self {
            Color::Light => 8,
            Color::Dark => -8,
        }
    }

    #[inline]
    pub const fn fen_char(self) -> char {
        match self {
            Color::Light => 'w',
            Color::Dark => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Light => write!(f, "white"),
            Color::Dark => write!(f, "black"),
        }
    }
}

/// Piece kind (color is carried separately by `Piece`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

pub const ALL_PIECE_KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

/// Kinds a pawn may promote to.
pub const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

impl PieceKind {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    #[inline]
    pub const fn is_promotion_choice(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }

    /// Lowercase FEN / LAN letter.
    #[inline]
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

/// A colored piece occupying one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for light, lowercase for dark.
    #[inline]
    pub const fn fen_char(self) -> char {
        let base = self.kind.letter();
        match self.color {
            Color::Light => base.to_ascii_uppercase(),
            Color::Dark => base,
        }
    }

    pub fn from_fen_char(ch: char) -> Option<Self> {
        let color = if ch.is_ascii_uppercase() {
            Color::Light
        } else if ch.is_ascii_lowercase() {
            Color::Dark
        } else {
            return None;
        };
        PieceKind::from_letter(ch).map(|kind| Piece::new(color, kind))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// Castling availability for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub light_kingside: bool,
    pub light_queenside: bool,
    pub dark_kingside: bool,
    pub dark_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        light_kingside: true,
        light_queenside: true,
        dark_kingside: true,
        dark_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        light_kingside: false,
        light_queenside: false,
        dark_kingside: false,
        dark_queenside: false,
    };

    #[inline]
    pub const fn allows(self, color: Color, kingside: bool) -> bool {
        match (color, kingside) {
            (Color::Light, true) => self.light_kingside,
            (Color::Light, false) => self.light_queenside,
            (Color::Dark, true) => self.dark_kingside,
            (Color::Dark, false) => self.dark_queenside,
        }
    }

    pub fn revoke_all(&mut self, color: Color) {
        match color {
            Color::Light => {
                self.light_kingside = false;
                self.light_queenside = false;
            }
            Color::Dark => {
                self.dark_kingside = false;
                self.dark_queenside = false;
            }
        }
    }

    /// Drop the right tied to a rook corner once anything leaves or lands on it.
    pub fn revoke_for_corner(&mut self, square: Square) {
        match square {
            0 => self.light_queenside = false,
            7 => self.light_kingside = false,
            56 => self.dark_queenside = false,
            63 => self.dark_kingside = false,
            _ => {}
        }
    }

    /// Packed 4-bit form used by Zobrist hashing.
    #[inline]
    pub const fn bits(self) -> u8 {
        (self.light_kingside as u8)
            | (self.light_queenside as u8) << 1
            | (self.dark_kingside as u8) << 2
            | (self.dark_queenside as u8) << 3
    }
}

#[inline]
pub const fn file_of(square: Square) -> u8 {
    square % 8
}

#[inline]
pub const fn rank_of(square: Square) -> u8 {
    square / 8
}

#[inline]
pub const fn square_at(file: u8, rank: u8) -> Square {
    rank * 8 + file
}

#[cfg(test)]
mod tests {
    use super::{CastlingRights, Color, Piece, PieceKind};

    #[test]
    fn fen_chars_encode_color_by_case() {
        let white_knight = Piece::new(Color::Light, PieceKind::Knight);
        assert_eq!(white_knight.fen_char(), 'N');
        assert_eq!(Piece::from_fen_char('q'), Some(Piece::new(Color::Dark, PieceKind::Queen)));
        assert_eq!(Piece::from_fen_char('x'), None);
    }

    #[test]
    fn rook_corner_revokes_only_its_right() {
        let mut rights = CastlingRights::ALL;
        rights.revoke_for_corner(63);
        assert!(!rights.dark_kingside);
        assert!(rights.dark_queenside);
        assert!(rights.allows(Color::Light, true));
        assert_eq!(rights.bits(), 0b1011);
    }

    #[test]
    fn config_style_color_names_deserialize() {
        let colors: Vec<Color> =
            serde_json::from_str(r#"["black", "white", "dark", "w"]"#).expect("colors should parse");
        assert_eq!(colors, vec![Color::Dark, Color::Light, Color::Dark, Color::Light]);
    }
}
