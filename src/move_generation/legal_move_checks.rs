//! Attack coverage queries used by the self-check filter, castling rules and
//! terminal detection.

use crate::game_state::chess_types::*;
use crate::game_state::position::OccupancyMasks;
use crate::moves::leaper_attacks::{king_attacks, knight_attacks, pawn_attacks};
use crate::moves::slider_attacks::{bishop_attacks, rook_attacks};

/// Whether any piece of `attacker` covers `square`.
pub fn is_square_attacked(masks: &OccupancyMasks, square: Square, attacker: Color) -> bool {
    // A pawn of `attacker` hits `square` iff a defender pawn on `square` would hit it back.
    if pawn_attacks(attacker.opposite(), square) & masks.of(attacker, PieceKind::Pawn) != 0 {
        return true;
    }
    if knight_attacks(square) & masks.of(attacker, PieceKind::Knight) != 0 {
        return true;
    }
    if king_attacks(square) & masks.of(attacker, PieceKind::King) != 0 {
        return true;
    }

    let queens = masks.of(attacker, PieceKind::Queen);
    let diagonal = masks.of(attacker, PieceKind::Bishop) | queens;
    if bishop_attacks(square, masks.all) & diagonal != 0 {
        return true;
    }
    let orthogonal = masks.of(attacker, PieceKind::Rook) | queens;
    rook_attacks(square, masks.all) & orthogonal != 0
}

/// Whether `color`'s king is attacked. A side without a king is never in check.
pub fn is_king_in_check(position: &Position, color: Color) -> bool {
    let Some(king_sq) = position.king_square(color) else {
        return false;
    };
    is_square_attacked(&position.masks(), king_sq, color.opposite())
}
