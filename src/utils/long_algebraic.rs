//! Long algebraic move text (`e2e4`, `e7e8q`).
//!
//! Moves from the vision subsystem and the console arrive as text. Parsing is
//! context-free except for castling notation, which needs the mover's color.

use crate::errors::ParseError;
use crate::game_state::chess_rules::castle_geometry;
use crate::game_state::chess_types::{Color, PieceKind};
use crate::moves::chess_move::Move;
use crate::utils::algebraic::algebraic_to_square;

fn move_error(text: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MoveText {
        text: text.to_owned(),
        reason: reason.into(),
    }
}

/// Parse `e2e4`, `e2-e4`, `e7e8q` or `e7e8=Q`.
pub fn parse_long_algebraic(text: &str) -> Result<Move, ParseError> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '=' | 'x' | '+' | '#'))
        .collect();

    if cleaned.len() != 4 && cleaned.len() != 5 || !cleaned.is_ascii() {
        return Err(move_error(text, "expected four or five characters"));
    }

    let from = algebraic_to_square(&cleaned[0..2]).map_err(|err| move_error(text, err.to_string()))?;
    let to = algebraic_to_square(&cleaned[2..4]).map_err(|err| move_error(text, err.to_string()))?;
    if from == to {
        return Err(move_error(text, "source and destination are the same square"));
    }

    match cleaned[4..].chars().next() {
        None => Ok(Move::new(from, to)),
        Some(letter) => {
            let kind = PieceKind::from_letter(letter)
                .filter(|kind| kind.is_promotion_choice())
                .ok_or_else(|| move_error(text, format!("'{letter}' is not a promotion piece")))?;
            Ok(Move::promotion(from, to, kind))
        }
    }
}

/// Parse move text for `side`, also accepting `O-O` / `O-O-O` (or zeros).
pub fn parse_move_text(text: &str, side: Color) -> Result<Move, ParseError> {
    let castle = match text.trim() {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    };

    match castle {
        Some(kingside) => {
            let geometry = castle_geometry(side, kingside);
            Ok(Move::castle(geometry.king_from, geometry.king_to))
        }
        None => parse_long_algebraic(text),
    }
}
