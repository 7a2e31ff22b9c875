use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::push_targets;
use crate::moves::chess_move::Move;
use crate::moves::slider_attacks::{bishop_attacks, queen_attacks, rook_attacks};

/// Pseudo-legal moves for the bishop, rook or queen standing on `from`.
pub fn generate_sliding_moves(board: &BoardState, from: Square, kind: PieceKind, out: &mut Vec<Move>) {
    let masks = board.position.masks();
    let own = masks.by_color[board.side_to_move.index()];
    let attacks = match kind {
        PieceKind::Bishop => bishop_attacks(from, masks.all),
        PieceKind::Rook => rook_attacks(from, masks.all),
        PieceKind::Queen => queen_attacks(from, masks.all),
        _ => 0,
    };
    push_targets(from, attacks & !own, out);
}

#[cfg(test)]
mod tests {
    use super::generate_sliding_moves;
    use crate::game_state::chess_types::{BoardState, PieceKind};

    #[test]
    fn boxed_in_pieces_have_no_moves() {
        let mut out = Vec::new();
        generate_sliding_moves(&BoardState::start(), 3, PieceKind::Queen, &mut out);
        generate_sliding_moves(&BoardState::start(), 0, PieceKind::Rook, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn lone_queen_sees_the_whole_board() {
        let board = BoardState::from_fen("k7/8/8/8/3Q4/8/8/7K w - - 0 1").expect("FEN should parse");
        let mut out = Vec::new();
        generate_sliding_moves(&board, 27, PieceKind::Queen, &mut out);
        assert_eq!(out.len(), 27);
    }
}
