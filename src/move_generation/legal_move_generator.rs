//! Legal move generation.
//!
//! Collects pseudo-legal moves per source square, simulates each one and
//! drops those that leave the mover's king attacked.

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::apply_move;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_moves_king::generate_king_moves;
use crate::move_generation::legal_moves_knight::generate_knight_moves;
use crate::move_generation::legal_moves_pawn::generate_pawn_moves;
use crate::move_generation::legal_moves_sliding::generate_sliding_moves;
use crate::move_generation::move_validator::LegalMove;
use crate::moves::chess_move::Move;

/// Pseudo-legal moves of the side-to-move piece on `from`. Empty when the
/// square is empty or holds an opponent piece.
pub fn generate_pseudo_moves_from(board: &BoardState, from: Square, out: &mut Vec<Move>) {
    let Some(piece) = board.position.piece_at(from) else {
        return;
    };
    if piece.color != board.side_to_move {
        return;
    }

    match piece.kind {
        PieceKind::Pawn => generate_pawn_moves(board, from, out),
        PieceKind::Knight => generate_knight_moves(board, from, out),
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            generate_sliding_moves(board, from, piece.kind, out)
        }
        PieceKind::King => generate_king_moves(board, from, out),
    }
}

pub fn generate_pseudo_moves(board: &BoardState) -> Vec<Move> {
    let mut out = Vec::with_capacity(64);
    let side = board.side_to_move;
    for (from, piece) in board.position.iter() {
        if piece.color == side {
            generate_pseudo_moves_from(board, from, &mut out);
        }
    }
    out
}

/// Every legal move with the board it produces.
pub fn legal_successors(board: &BoardState) -> Vec<(Move, BoardState)> {
    let side = board.side_to_move;
    generate_pseudo_moves(board)
        .into_iter()
        .filter_map(|mv| {
            let applied = apply_move(board, mv).ok()?;
            (!is_king_in_check(&applied.board.position, side)).then_some((mv, applied.board))
        })
        .collect()
}

pub fn has_any_legal_move(board: &BoardState) -> bool {
    let side = board.side_to_move;
    generate_pseudo_moves(board).into_iter().any(|mv| {
        apply_move(board, mv)
            .map(|applied| !is_king_in_check(&applied.board.position, side))
            .unwrap_or(false)
    })
}

/// All moves the side to move may play, already approved by the validator.
pub fn legal_moves(game_state: &GameState) -> Vec<LegalMove> {
    let board = game_state.board();
    let key = board.key();
    generate_pseudo_moves(board)
        .into_iter()
        .filter_map(|mv| LegalMove::simulate(board, key, mv).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{has_any_legal_move, legal_moves, legal_successors};
    use crate::game_state::chess_types::{BoardState, GameState};
    use crate::move_generation::legal_move_checks::is_king_in_check;

    #[test]
    fn start_position_has_twenty_moves() {
        let game = GameState::new_game();
        assert_eq!(legal_moves(&game).len(), 20);
        assert_eq!(legal_successors(game.board()).len(), 20);
    }

    #[test]
    fn no_legal_move_leaves_own_king_in_check() {
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp2ppp/8/3pp3/4P3/5Q2/PPPP1PPP/RNB1KBNR b KQkq - 1 3",
        ];
        for fen in fens {
            let game = GameState::from_fen(fen).expect("FEN should parse");
            let mover = game.side_to_move();
            for legal in legal_moves(&game) {
                assert!(
                    !is_king_in_check(&legal.board_after().position, mover),
                    "{} leaves the king in check in {fen}",
                    legal.mv()
                );
            }
        }
    }

    #[test]
    fn stalemated_side_has_no_moves() {
        let board = BoardState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("FEN should parse");
        assert!(!has_any_legal_move(&board));
    }
}
