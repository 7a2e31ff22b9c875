//! Attack tables for pieces that jump to fixed offsets: knight, king, pawn.
//!
//! Tables are built at compile time from (file, rank) offsets so edge
//! wrap-around never needs a runtime check.

use crate::game_state::chess_types::{Color, Square};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const LIGHT_PAWN_CAPTURE_OFFSETS: [(i32, i32); 2] = [(-1, 1), (1, 1)];
const DARK_PAWN_CAPTURE_OFFSETS: [(i32, i32); 2] = [(-1, -1), (1, -1)];

pub const KNIGHT_ATTACKS: [u64; 64] = build_table(&KNIGHT_OFFSETS);
pub const KING_ATTACKS: [u64; 64] = build_table(&KING_OFFSETS);

/// Pawn capture targets, indexed by `[color][square]`.
pub const PAWN_ATTACKS: [[u64; 64]; 2] = [
    build_table(&LIGHT_PAWN_CAPTURE_OFFSETS),
    build_table(&DARK_PAWN_CAPTURE_OFFSETS),
];

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square as usize]
}

/// Squares a pawn of `color` standing on `square` attacks.
#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    PAWN_ATTACKS[color.index()][square as usize]
}

const fn build_table(offsets: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < offsets.len() {
            attacks |= bit_if_on_board(file + offsets[i].0, rank + offsets[i].1);
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

const fn bit_if_on_board(file: i32, rank: i32) -> u64 {
    if file < 0 || file > 7 || rank < 0 || rank > 7 {
        return 0;
    }
    1u64 << (rank * 8 + file)
}
