use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::push_pawn_move;
use crate::moves::chess_move::Move;
use crate::moves::leaper_attacks::pawn_attacks;

/// Pseudo-legal pawn moves from `from` for the side to move.
pub fn generate_pawn_moves(board: &BoardState, from: Square, out: &mut Vec<Move>) {
    let side = board.side_to_move;
    let masks = board.position.masks();
    let empty = !masks.all;
    let step = side.pawn_step();

    let one_step = from as i8 + step;
    if (0..64).contains(&one_step) && empty & (1u64 << one_step) != 0 {
        push_pawn_move(side, from, one_step as Square, out);

        let two_step = one_step + step;
        if rank_of(from) == side.pawn_start_rank() && empty & (1u64 << two_step) != 0 {
            out.push(Move::new(from, two_step as Square));
        }
    }

    let attacks = pawn_attacks(side, from);
    let mut captures = attacks & masks.by_color[side.opposite().index()];
    while captures != 0 {
        let to = captures.trailing_zeros() as Square;
        push_pawn_move(side, from, to, out);
        captures &= captures - 1;
    }

    if let Some(ep) = board.en_passant_square {
        if attacks & (1u64 << ep) != 0 {
            out.push(Move::en_passant(from, ep));
        }
    }
}
