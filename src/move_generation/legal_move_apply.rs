//! Raw move application on a `BoardState`.
//!
//! No legality checks happen here beyond requiring a piece on the source
//! square. The validator simulates candidate moves with it, and the board
//! store uses it to commit approved moves.

use crate::errors::IllegalStateError;
use crate::game_state::chess_rules::castle_geometry_for;
use crate::game_state::chess_types::*;
use crate::moves::chess_move::{Move, MoveKind};

/// Board after a move plus what moved and what was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub board: BoardState,
    pub moved: Piece,
    pub captured: Option<(Square, Piece)>,
}

/// Square of the pawn removed by an en-passant capture landing on `to`.
#[inline]
pub fn en_passant_victim_square(mover: Color, to: Square) -> Square {
    (to as i8 - mover.pawn_step()) as Square
}

pub fn apply_move(board: &BoardState, mv: Move) -> Result<AppliedMove, IllegalStateError> {
    let from = mv.from();
    let to = mv.to();
    let mover = board.side_to_move;

    let mut next = *board;
    let moved = next
        .position
        .take(from)
        .ok_or(IllegalStateError::EmptySource(from))?;

    let captured = match mv.kind() {
        MoveKind::EnPassant => {
            let victim_sq = en_passant_victim_square(mover, to);
            next.position.take(victim_sq).map(|piece| (victim_sq, piece))
        }
        _ => next.position.take(to).map(|piece| (to, piece)),
    };

    let landing = match mv.promotion_kind() {
        Some(kind) if moved.kind == PieceKind::Pawn => Piece::new(mover, kind),
        _ => moved,
    };
    next.position.set(to, Some(landing));

    if mv.kind() == MoveKind::Castle {
        if let Some(geometry) = castle_geometry_for(mover, from, to) {
            let rook = next.position.take(geometry.rook_from);
            next.position.set(geometry.rook_to, rook);
        }
    }

    if moved.kind == PieceKind::King {
        next.castling_rights.revoke_all(mover);
    }
    next.castling_rights.revoke_for_corner(from);
    next.castling_rights.revoke_for_corner(to);

    let double_push = moved.kind == PieceKind::Pawn && from.abs_diff(to) == 16;
    next.en_passant_square = double_push.then(|| (from + to) / 2);

    if moved.kind == PieceKind::Pawn || captured.is_some() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if mover == Color::Dark {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }
    next.side_to_move = mover.opposite();

    Ok(AppliedMove {
        board: next,
        moved,
        captured,
    })
}
