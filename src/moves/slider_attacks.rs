//! Occupancy-aware attacks for bishops, rooks and queens.
//!
//! Rays stop at the first occupied square and include it, so callers mask out
//! their own pieces afterwards.

use crate::game_state::chess_types::Square;

const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const ORTHOGONAL_STEPS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    DIAGONAL_STEPS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ORTHOGONAL_STEPS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

fn trace_ray(square: Square, file_step: i32, rank_step: i32, occupancy: u64) -> u64 {
    let mut file = (square % 8) as i32 + file_step;
    let mut rank = (square / 8) as i32 + rank_step;
    let mut attacks = 0u64;

    while (0..8).contains(&file) && (0..8).contains(&rank) {
        let bit = 1u64 << (rank * 8 + file);
        attacks |= bit;
        if occupancy & bit != 0 {
            break;
        }
        file += file_step;
        rank += rank_step;
    }

    attacks
}
