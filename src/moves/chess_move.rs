//! Move value type.
//!
//! A `Move` is what a player or the vision subsystem proposes: two squares,
//! an optional promotion choice and a kind flag. It says nothing about
//! legality; `move_validator::validate` turns it into a `LegalMove`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::game_state::chess_types::{PieceKind, Square};
use crate::utils::algebraic::square_name;
use crate::utils::long_algebraic::parse_long_algebraic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Normal,
    Castle,
    EnPassant,
    Promotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
    kind: MoveKind,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    #[inline]
    pub const fn promotion(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
            kind: MoveKind::Promotion,
        }
    }

    #[inline]
    pub const fn castle(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            kind: MoveKind::Castle,
        }
    }

    #[inline]
    pub const fn en_passant(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            kind: MoveKind::EnPassant,
        }
    }

    #[inline]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(&self) -> Square {
        self.to
    }

    #[inline]
    pub const fn promotion_kind(&self) -> Option<PieceKind> {
        self.promotion
    }

    #[inline]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// Same squares and promotion choice, regardless of the kind flag.
    #[inline]
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Long algebraic form, e.g. `e2e4` or `e7e8q`.
    pub fn to_lan(&self) -> String {
        let mut out = square_name(self.from);
        out.push_str(&square_name(self.to));
        if let Some(kind) = self.promotion {
            out.push(kind.letter());
        }
        out
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lan())
    }
}

/// Context-free parse of LAN text; castle and en-passant kinds are inferred
/// later from the position.
impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_long_algebraic(s)
    }
}
