//! Zobrist hashing support for position identity and repetition tracking.
//!
//! The keys are generated from a fixed seed so hashes are deterministic across
//! runs, which keeps persisted repetition histories valid after a restart.

use std::sync::OnceLock;

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::apply_move;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::moves::chess_move::Move;
use crate::moves::leaper_attacks::pawn_attacks;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x5EED_C0FF_EE00_B07A;

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = next_random_u64(&mut seed);
            }
        }
    }

    let side_to_move = next_random_u64(&mut seed);

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = next_random_u64(&mut seed);
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = next_random_u64(&mut seed);
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Compute the position key of a board.
///
/// The en-passant file only contributes when a pawn of the side to move has a
/// legal capture there, so a double push that offers no capture (or only one
/// by a pinned pawn) does not make an otherwise repeated position look new.
pub fn compute_position_key(board: &BoardState) -> u64 {
    let tables = tables();
    let mut key = 0u64;

    for (sq, piece) in board.position.iter() {
        key ^= tables.piece_square[piece.color.index()][piece.kind.index()][sq as usize];
    }

    if board.side_to_move == Color::Dark {
        key ^= tables.side_to_move;
    }

    key ^= tables.castling[(board.castling_rights.bits() & 0x0F) as usize];

    if let Some(ep_square) = board.en_passant_square {
        if en_passant_capturable(board, ep_square) {
            key ^= tables.en_passant_file[file_of(ep_square) as usize];
        }
    }

    key
}

fn en_passant_capturable(board: &BoardState, ep_square: Square) -> bool {
    let mover = board.side_to_move;
    let own_pawns = board.position.masks().of(mover, PieceKind::Pawn);
    // Squares from which a pawn of `mover` attacks `ep_square`.
    let mut attackers = pawn_attacks(mover.opposite(), ep_square) & own_pawns;

    while attackers != 0 {
        let from = attackers.trailing_zeros() as Square;
        attackers &= attackers - 1;
        let legal = apply_move(board, Move::en_passant(from, ep_square))
            .is_ok_and(|applied| !is_king_in_check(&applied.board.position, mover));
        if legal {
            return true;
        }
    }
    false
}
