use crate::game_state::chess_types::*;
use crate::moves::chess_move::Move;

/// Push a plain move for every set bit of `targets`.
#[inline]
pub fn push_targets(from: Square, mut targets: u64, out: &mut Vec<Move>) {
    while targets != 0 {
        let to = targets.trailing_zeros() as Square;
        out.push(Move::new(from, to));
        targets &= targets - 1;
    }
}

/// Push a pawn move, expanding it into the four promotion choices on the last rank.
#[inline]
pub fn push_pawn_move(color: Color, from: Square, to: Square, out: &mut Vec<Move>) {
    if rank_of(to) == color.promotion_rank() {
        out.extend(PROMOTION_KINDS.iter().map(|&kind| Move::promotion(from, to, kind)));
    } else {
        out.push(Move::new(from, to));
    }
}
