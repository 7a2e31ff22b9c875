use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::push_targets;
use crate::moves::chess_move::Move;
use crate::moves::leaper_attacks::knight_attacks;

pub fn generate_knight_moves(board: &BoardState, from: Square, out: &mut Vec<Move>) {
    let own = board.position.masks().by_color[board.side_to_move.index()];
    push_targets(from, knight_attacks(from) & !own, out);
}
