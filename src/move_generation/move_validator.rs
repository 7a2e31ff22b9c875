//! Move validation.
//!
//! `validate` is the only way to obtain a `LegalMove`. It is pure: the game
//! state is read, never written, and the same inputs always give the same
//! verdict.

use crate::errors::IllegalMoveReason;
use crate::game_state::chess_rules::{castle_geometry, castle_geometry_for};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::{apply_move, en_passant_victim_square};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::generate_pseudo_moves_from;
use crate::move_generation::legal_moves_king::castling_permitted;
use crate::moves::chess_move::{Move, MoveKind};
use crate::moves::leaper_attacks::pawn_attacks;

/// A move approved against one specific game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMove {
    mv: Move,
    moved: Piece,
    captured: Option<(Square, Piece)>,
    gives_check: bool,
    validated_key: u64,
    board_after: BoardState,
}

impl LegalMove {
    /// The move with its kind resolved from the board (castle, en passant,
    /// promotion), regardless of how it was submitted.
    #[inline]
    pub fn mv(&self) -> Move {
        self.mv
    }

    #[inline]
    pub fn moved(&self) -> Piece {
        self.moved
    }

    #[inline]
    pub fn captured(&self) -> Option<(Square, Piece)> {
        self.captured
    }

    #[inline]
    pub fn gives_check(&self) -> bool {
        self.gives_check
    }

    /// Position key of the state this move was validated against.
    #[inline]
    pub fn validated_key(&self) -> u64 {
        self.validated_key
    }

    #[inline]
    pub fn board_after(&self) -> &BoardState {
        &self.board_after
    }

    /// Simulate `mv` and keep it only if the mover's king ends up safe.
    pub(crate) fn simulate(board: &BoardState, key: u64, mv: Move) -> Result<Self, IllegalMoveReason> {
        let mover = board.side_to_move;
        let applied = apply_move(board, mv).map_err(|_| IllegalMoveReason::NoPieceAtSource)?;
        if is_king_in_check(&applied.board.position, mover) {
            return Err(IllegalMoveReason::LeavesKingInCheck);
        }

        Ok(Self {
            mv,
            moved: applied.moved,
            captured: applied.captured,
            gives_check: is_king_in_check(&applied.board.position, mover.opposite()),
            validated_key: key,
            board_after: applied.board,
        })
    }
}

/// Check whether `side` may play `mv` in `game_state`.
///
/// The declared move kind is a hint. A `Normal` move whose geometry is a
/// castle or an en-passant capture is validated as one, while an explicit
/// `Castle` or `EnPassant` that does not match the board is refused with the
/// matching special-move reason.
pub fn validate(game_state: &GameState, side: Color, mv: Move) -> Result<LegalMove, IllegalMoveReason> {
    let board = game_state.board();
    if side != board.side_to_move {
        return Err(IllegalMoveReason::WrongSide);
    }

    let piece = board
        .position
        .piece_at(mv.from())
        .ok_or(IllegalMoveReason::NoPieceAtSource)?;
    if piece.color != side {
        return Err(IllegalMoveReason::WrongSide);
    }

    let resolved = match resolve_special_move(board, piece, mv)? {
        Some(special) => special,
        None => resolve_regular_move(board, piece, mv)?,
    };

    LegalMove::simulate(board, board.key(), resolved)
}

/// Castle and en-passant handling. `Ok(None)` means the move is not special.
fn resolve_special_move(board: &BoardState, piece: Piece, mv: Move) -> Result<Option<Move>, IllegalMoveReason> {
    let side = piece.color;

    let castle = match piece.kind {
        PieceKind::King => castle_geometry_for(side, mv.from(), mv.to()),
        _ => None,
    };
    if let Some(geometry) = castle {
        if mv.promotion_kind().is_some() {
            return Err(IllegalMoveReason::InvalidPromotionChoice);
        }
        let kingside = geometry == castle_geometry(side, true);
        if !castling_permitted(board, &geometry, kingside) {
            return Err(IllegalMoveReason::InvalidCastle);
        }
        return Ok(Some(Move::castle(mv.from(), mv.to())));
    }
    if mv.kind() == MoveKind::Castle {
        return Err(IllegalMoveReason::InvalidCastle);
    }

    let diagonal_to_ep = piece.kind == PieceKind::Pawn
        && board.en_passant_square == Some(mv.to())
        && pawn_attacks(side, mv.from()) & (1u64 << mv.to()) != 0;
    if diagonal_to_ep {
        let victim = board.position.piece_at(en_passant_victim_square(side, mv.to()));
        if victim != Some(Piece::new(side.opposite(), PieceKind::Pawn)) {
            return Err(IllegalMoveReason::InvalidEnPassant);
        }
        if mv.promotion_kind().is_some() {
            return Err(IllegalMoveReason::InvalidPromotionChoice);
        }
        return Ok(Some(Move::en_passant(mv.from(), mv.to())));
    }
    if mv.kind() == MoveKind::EnPassant {
        return Err(IllegalMoveReason::InvalidEnPassant);
    }

    Ok(None)
}

/// Pattern membership plus promotion rules for every other move.
fn resolve_regular_move(board: &BoardState, piece: Piece, mv: Move) -> Result<Move, IllegalMoveReason> {
    let mut candidates = Vec::with_capacity(32);
    generate_pseudo_moves_from(board, mv.from(), &mut candidates);

    let reaches = candidates
        .iter()
        .any(|candidate| candidate.to() == mv.to() && candidate.kind() != MoveKind::Castle);
    if !reaches {
        return Err(IllegalMoveReason::BlockedPath);
    }

    let on_last_rank = piece.kind == PieceKind::Pawn && rank_of(mv.to()) == piece.color.promotion_rank();
    match (on_last_rank, mv.promotion_kind()) {
        (true, Some(kind)) if kind.is_promotion_choice() => Ok(Move::promotion(mv.from(), mv.to(), kind)),
        (true, _) => Err(IllegalMoveReason::InvalidPromotionChoice),
        (false, Some(_)) => Err(IllegalMoveReason::InvalidPromotionChoice),
        (false, None) if mv.kind() == MoveKind::Promotion => Err(IllegalMoveReason::InvalidPromotionChoice),
        (false, None) => Ok(Move::new(mv.from(), mv.to())),
    }
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::errors::IllegalMoveReason;
    use crate::game_state::chess_types::{Color, GameState, PieceKind};
    use crate::moves::chess_move::{Move, MoveKind};

    fn lan(text: &str) -> Move {
        text.parse().expect("test move should parse")
    }

    #[test]
    fn opening_pawn_push_is_legal() {
        let game = GameState::new_game();
        let legal = validate(&game, Color::Light, lan("e2e4")).expect("e2e4 should be legal");
        assert_eq!(legal.mv(), Move::new(12, 28));
        assert_eq!(legal.board_after().side_to_move, Color::Dark);
        assert_eq!(legal.validated_key(), game.board().key());
    }

    #[test]
    fn unreachable_destination_is_blocked() {
        let game = GameState::new_game();
        assert_eq!(validate(&game, Color::Light, lan("e2e5")), Err(IllegalMoveReason::BlockedPath));
        assert_eq!(validate(&game, Color::Light, lan("a1a3")), Err(IllegalMoveReason::BlockedPath));
        assert_eq!(validate(&game, Color::Light, lan("d1d2")), Err(IllegalMoveReason::BlockedPath));
    }

    #[test]
    fn ownership_and_turn_are_checked_first() {
        let game = GameState::new_game();
        assert_eq!(validate(&game, Color::Dark, lan("e7e5")), Err(IllegalMoveReason::WrongSide));
        assert_eq!(validate(&game, Color::Light, lan("e7e5")), Err(IllegalMoveReason::WrongSide));
        assert_eq!(validate(&game, Color::Light, lan("e3e4")), Err(IllegalMoveReason::NoPieceAtSource));
    }

    #[test]
    fn pinned_piece_cannot_expose_the_king() {
        let game = GameState::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").expect("FEN should parse");
        assert_eq!(
            validate(&game, Color::Light, lan("e2d3")),
            Err(IllegalMoveReason::LeavesKingInCheck)
        );
    }

    #[test]
    fn castling_after_the_king_moved_is_refused() {
        let game = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w kq - 2 5").expect("FEN should parse");
        assert_eq!(validate(&game, Color::Light, lan("e1g1")), Err(IllegalMoveReason::InvalidCastle));
        assert_eq!(
            validate(&game, Color::Light, Move::castle(4, 6)),
            Err(IllegalMoveReason::InvalidCastle)
        );
        assert_eq!(
            validate(&game, Color::Light, Move::castle(4, 5)),
            Err(IllegalMoveReason::InvalidCastle)
        );
    }

    #[test]
    fn castling_text_is_resolved_to_a_castle() {
        let game = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        let legal = validate(&game, Color::Light, lan("e1c1")).expect("O-O-O should be legal");
        assert_eq!(legal.mv().kind(), MoveKind::Castle);
    }

    #[test]
    fn en_passant_needs_the_fresh_double_push() {
        let fresh = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").expect("FEN should parse");
        let legal = validate(&fresh, Color::Light, lan("e5d6")).expect("exd6 e.p. should be legal");
        assert_eq!(legal.mv().kind(), MoveKind::EnPassant);
        assert_eq!(legal.captured().map(|(sq, _)| sq), Some(35));

        let stale = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2").expect("FEN should parse");
        assert_eq!(validate(&stale, Color::Light, lan("e5d6")), Err(IllegalMoveReason::BlockedPath));
        assert_eq!(
            validate(&stale, Color::Light, Move::en_passant(36, 43)),
            Err(IllegalMoveReason::InvalidEnPassant)
        );
    }

    #[test]
    fn promotion_requires_a_valid_choice_on_the_last_rank() {
        let game = GameState::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        assert_eq!(validate(&game, Color::Light, lan("a7a8")), Err(IllegalMoveReason::InvalidPromotionChoice));
        assert_eq!(
            validate(&game, Color::Light, Move::promotion(48, 56, PieceKind::King)),
            Err(IllegalMoveReason::InvalidPromotionChoice)
        );
        let legal = validate(&game, Color::Light, lan("a7a8q")).expect("a8=Q should be legal");
        assert_eq!(legal.mv().promotion_kind(), Some(PieceKind::Queen));

        let quiet = GameState::new_game();
        assert_eq!(
            validate(&quiet, Color::Light, Move::promotion(12, 20, PieceKind::Queen)),
            Err(IllegalMoveReason::InvalidPromotionChoice)
        );
    }

    #[test]
    fn validation_does_not_touch_the_game() {
        let game = GameState::new_game();
        let before = game.clone();
        let _ = validate(&game, Color::Light, lan("e2e4"));
        let _ = validate(&game, Color::Light, lan("e2e5"));
        assert_eq!(game, before);
    }
}
