//! Perft node counting for move-generation correctness checks.

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::{apply_move, AppliedMove};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::generate_pseudo_moves;
use crate::moves::chess_move::{Move, MoveKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
    }

    fn record_leaf(&mut self, mv: Move, applied: &AppliedMove) {
        self.nodes += 1;
        if applied.captured.is_some() {
            self.captures += 1;
        }
        match mv.kind() {
            MoveKind::EnPassant => self.en_passant += 1,
            MoveKind::Castle => self.castles += 1,
            MoveKind::Promotion => self.promotions += 1,
            MoveKind::Normal => {}
        }
        if is_king_in_check(&applied.board.position, applied.board.side_to_move) {
            self.checks += 1;
        }
    }
}

pub fn perft(board: &BoardState, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }

    let mut total = PerftCounts::default();
    for (mv, applied) in legal_applied(board) {
        if depth == 1 {
            total.record_leaf(mv, &applied);
        } else {
            total.merge(perft(&applied.board, depth - 1));
        }
    }
    total
}

/// Node count below each root move, sorted by move text.
pub fn perft_divide(board: &BoardState, depth: u8) -> Vec<(Move, u64)> {
    let mut split: Vec<(Move, u64)> = legal_applied(board)
        .into_iter()
        .map(|(mv, applied)| {
            let nodes = match depth {
                0 | 1 => 1,
                _ => perft(&applied.board, depth - 1).nodes,
            };
            (mv, nodes)
        })
        .collect();
    split.sort_by_key(|(mv, _)| mv.to_lan());
    split
}

fn legal_applied(board: &BoardState) -> Vec<(Move, AppliedMove)> {
    let side = board.side_to_move;
    generate_pseudo_moves(board)
        .into_iter()
        .filter_map(|mv| {
            let applied = apply_move(board, mv).ok()?;
            (!is_king_in_check(&applied.board.position, side)).then_some((mv, applied))
        })
        .collect()
}
