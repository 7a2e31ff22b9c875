use crate::game_state::chess_rules::{castle_geometry, CastleGeometry};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::move_generation::legal_move_shared::push_targets;
use crate::moves::chess_move::Move;
use crate::moves::leaper_attacks::king_attacks;

pub fn generate_king_moves(board: &BoardState, from: Square, out: &mut Vec<Move>) {
    let own = board.position.masks().by_color[board.side_to_move.index()];
    push_targets(from, king_attacks(from) & !own, out);

    for kingside in [true, false] {
        let geometry = castle_geometry(board.side_to_move, kingside);
        if geometry.king_from == from && castling_permitted(board, &geometry, kingside) {
            out.push(Move::castle(geometry.king_from, geometry.king_to));
        }
    }
}

/// Castling preconditions for the side to move: the right is still held, the
/// king and rook stand on their home squares, the squares between them are
/// empty, and the king is not in check nor crosses or lands on an attacked square.
pub fn castling_permitted(board: &BoardState, geometry: &CastleGeometry, kingside: bool) -> bool {
    let side = board.side_to_move;
    if !board.castling_rights.allows(side, kingside) {
        return false;
    }
    if board.position.piece_at(geometry.king_from) != Some(Piece::new(side, PieceKind::King))
        || board.position.piece_at(geometry.rook_from) != Some(Piece::new(side, PieceKind::Rook))
    {
        return false;
    }

    let masks = board.position.masks();
    if masks.all & geometry.must_be_empty != 0 {
        return false;
    }

    let enemy = side.opposite();
    std::iter::once(geometry.king_from)
        .chain(geometry.king_path)
        .all(|sq| !is_square_attacked(&masks, sq, enemy))
}

#[cfg(test)]
mod tests {
    use super::{castling_permitted, generate_king_moves};
    use crate::game_state::chess_rules::castle_geometry;
    use crate::game_state::chess_types::{BoardState, Color};
    use crate::moves::chess_move::Move;

    #[test]
    fn both_castles_offered_on_open_back_rank() {
        let board = BoardState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        let mut out = Vec::new();
        generate_king_moves(&board, 4, &mut out);
        assert!(out.contains(&Move::castle(4, 6)));
        assert!(out.contains(&Move::castle(4, 2)));
    }

    #[test]
    fn attacked_transit_square_forbids_castling() {
        // Black rook on f8 covers f1.
        let board = BoardState::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("FEN should parse");
        assert!(!castling_permitted(&board, &castle_geometry(Color::Light, true), true));
        assert!(castling_permitted(&board, &castle_geometry(Color::Light, false), false));
    }

    #[test]
    fn queenside_b_file_square_may_be_attacked_but_not_occupied() {
        let attacked_b1 =
            BoardState::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").expect("FEN should parse");
        assert!(castling_permitted(&attacked_b1, &castle_geometry(Color::Light, false), false));

        let occupied_b1 =
            BoardState::from_fen("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").expect("FEN should parse");
        assert!(!castling_permitted(&occupied_b1, &castle_geometry(Color::Light, false), false));
    }
}
