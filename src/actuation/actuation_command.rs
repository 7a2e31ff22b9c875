//! Translation of an approved move into arm motion primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_state::chess_rules::castle_geometry_for;
use crate::game_state::chess_types::{PieceKind, Square};
use crate::move_generation::move_validator::LegalMove;
use crate::moves::chess_move::{Move, MoveKind};
use crate::utils::algebraic::square_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum ArmPrimitive {
    PickUp { square: Square },
    Place { square: Square },
    /// Lift a captured piece off `square` and drop it in the capture tray.
    RemoveCaptured { square: Square },
    /// Swap the pawn on `square` for a piece of `kind` from the reserve.
    ExchangeForPromotion { square: Square, kind: PieceKind },
}

impl fmt::Display for ArmPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmPrimitive::PickUp { square } => write!(f, "pick-up {}", square_name(*square)),
            ArmPrimitive::Place { square } => write!(f, "place {}", square_name(*square)),
            ArmPrimitive::RemoveCaptured { square } => {
                write!(f, "remove-captured {}", square_name(*square))
            }
            ArmPrimitive::ExchangeForPromotion { square, kind } => {
                write!(f, "promote {} to {kind}", square_name(*square))
            }
        }
    }
}

/// One arm job: the ordered primitives that realize `mv` on the physical board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub id: u64,
    pub mv: Move,
    pub primitives: Vec<ArmPrimitive>,
}

impl ActuationCommand {
    /// Captured pieces leave the board first so the destination is free,
    /// castling moves the king before the rook, and a promotion exchange
    /// happens once the pawn stands on the last rank.
    pub fn for_move(id: u64, legal: &LegalMove) -> Self {
        let mv = legal.mv();
        let mut primitives = Vec::with_capacity(6);

        if let Some((square, _)) = legal.captured() {
            primitives.push(ArmPrimitive::RemoveCaptured { square });
        }
        primitives.push(ArmPrimitive::PickUp { square: mv.from() });
        primitives.push(ArmPrimitive::Place { square: mv.to() });

        if mv.kind() == MoveKind::Castle {
            if let Some(geometry) = castle_geometry_for(legal.moved().color, mv.from(), mv.to()) {
                primitives.push(ArmPrimitive::PickUp {
                    square: geometry.rook_from,
                });
                primitives.push(ArmPrimitive::Place {
                    square: geometry.rook_to,
                });
            }
        }

        if let Some(kind) = mv.promotion_kind() {
            primitives.push(ArmPrimitive::ExchangeForPromotion { square: mv.to(), kind });
        }

        Self { id, mv, primitives }
    }
}

impl fmt::Display for ActuationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.primitives.iter().map(ToString::to_string).collect();
        write!(f, "#{} {} [{}]", self.id, self.mv, steps.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActuationCommand, ArmPrimitive};
    use crate::game_state::chess_types::{Color, GameState, PieceKind};
    use crate::move_generation::move_validator::validate;

    fn command_for(fen: &str, side: Color, text: &str) -> ActuationCommand {
        let game = GameState::from_fen(fen).expect("FEN should parse");
        let legal = validate(&game, side, text.parse().expect("move should parse")).expect("move should be legal");
        ActuationCommand::for_move(7, &legal)
    }

    #[test]
    fn capture_removes_the_victim_first() {
        let command = command_for(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            Color::Light,
            "e4d5",
        );
        assert_eq!(
            command.primitives,
            vec![
                ArmPrimitive::RemoveCaptured { square: 35 },
                ArmPrimitive::PickUp { square: 28 },
                ArmPrimitive::Place { square: 35 },
            ]
        );
        assert_eq!(command.id, 7);
    }

    #[test]
    fn castle_moves_king_then_rook() {
        let command = command_for("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", Color::Dark, "e8c8");
        assert_eq!(
            command.primitives,
            vec![
                ArmPrimitive::PickUp { square: 60 },
                ArmPrimitive::Place { square: 58 },
                ArmPrimitive::PickUp { square: 56 },
                ArmPrimitive::Place { square: 59 },
            ]
        );
    }

    #[test]
    fn en_passant_removes_the_pawn_beside_the_target() {
        let command = command_for("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1", Color::Dark, "d4e3");
        assert_eq!(command.primitives[0], ArmPrimitive::RemoveCaptured { square: 28 });
        assert_eq!(command.primitives[2], ArmPrimitive::Place { square: 20 });
    }

    #[test]
    fn promotion_ends_with_an_exchange() {
        let command = command_for("4k3/8/8/8/8/8/p7/4K3 b - - 0 1", Color::Dark, "a2a1n");
        assert_eq!(
            command.primitives.last(),
            Some(&ArmPrimitive::ExchangeForPromotion {
                square: 0,
                kind: PieceKind::Knight
            })
        );
        assert_eq!(command.to_string(), "#7 a2a1n [pick-up a2, place a1, promote a1 to knight]");
    }
}
