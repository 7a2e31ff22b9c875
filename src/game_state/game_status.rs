//! Terminal detection results and final game outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_state::chess_types::Color;

/// What the board itself says about the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TerminalStatus {
    None,
    Checkmate { winner: Color },
    Stalemate,
    DrawByRepetition,
    DrawByFiftyMove,
    DrawByInsufficientMaterial,
}

impl TerminalStatus {
    #[inline]
    pub fn is_over(self) -> bool {
        self != TerminalStatus::None
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            TerminalStatus::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::None => write!(f, "in progress"),
            TerminalStatus::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            TerminalStatus::Stalemate => write!(f, "stalemate"),
            TerminalStatus::DrawByRepetition => write!(f, "draw by threefold repetition"),
            TerminalStatus::DrawByFiftyMove => write!(f, "draw by the fifty-move rule"),
            TerminalStatus::DrawByInsufficientMaterial => {
                write!(f, "draw by insufficient material")
            }
        }
    }
}

/// How a finished game ended, whether decided on the board or by the players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GameResult {
    Terminal { status: TerminalStatus },
    Resigned { winner: Color },
    /// The loser's clock ran out.
    TimeForfeit { winner: Color },
    DrawAgreed,
}

impl GameResult {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::Terminal { status } => status.winner(),
            GameResult::Resigned { winner } | GameResult::TimeForfeit { winner } => Some(winner),
            GameResult::DrawAgreed => None,
        }
    }

    /// PGN result tag: `1-0`, `0-1` or `1/2-1/2`.
    pub fn pgn_result(self) -> &'static str {
        match self.winner() {
            Some(Color::Light) => "1-0",
            Some(Color::Dark) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl From<TerminalStatus> for GameResult {
    fn from(status: TerminalStatus) -> Self {
        GameResult::Terminal { status }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Terminal { status } => write!(f, "{status}"),
            GameResult::Resigned { winner } => {
                write!(f, "{} resigned, {winner} wins", winner.opposite())
            }
            GameResult::TimeForfeit { winner } => {
                write!(f, "{} lost on time, {winner} wins", winner.opposite())
            }
            GameResult::DrawAgreed => write!(f, "draw by agreement"),
        }
    }
}
