//! Turn phases and the pure transition function between them.
//!
//! ```text
//! AwaitingInput --Submit--> Validating --Reject--------------------> AwaitingInput
//!                           Validating --ApproveWithoutActuation---> AwaitingInput
//!                           Validating --ApproveWithActuation------> AwaitingActuation
//! AwaitingActuation --AckSuccess--> ActuationComplete --Complete--> AwaitingInput
//! AwaitingActuation --AckFailure | Abort--> Error --OperatorReset--> AwaitingInput
//! AwaitingInput | ActuationComplete --GameEnded--> GameOver --NewGame--> AwaitingInput
//! any --Fault--> Error
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingInput,
    Validating,
    AwaitingActuation,
    ActuationComplete,
    Error,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEvent {
    Submit,
    Reject,
    ApproveWithoutActuation,
    ApproveWithActuation,
    AckSuccess,
    AckFailure,
    Complete,
    GameEnded,
    Fault,
    Abort,
    OperatorReset,
    NewGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event:?} is not valid while the turn phase is {phase}")]
pub struct TransitionError {
    pub phase: TurnPhase,
    pub event: TurnEvent,
}

impl TurnPhase {
    pub fn transition(self, event: TurnEvent) -> Result<TurnPhase, TransitionError> {
        use TurnEvent as E;
        use TurnPhase as P;

        let next = match (self, event) {
            (_, E::Fault) => P::Error,
            (P::AwaitingInput, E::Submit) => P::Validating,
            (P::Validating, E::Reject) => P::AwaitingInput,
            (P::Validating, E::ApproveWithoutActuation) => P::AwaitingInput,
            (P::Validating, E::ApproveWithActuation) => P::AwaitingActuation,
            (P::AwaitingActuation, E::AckSuccess) => P::ActuationComplete,
            (P::AwaitingActuation, E::AckFailure | E::Abort) => P::Error,
            (P::ActuationComplete, E::Complete) => P::AwaitingInput,
            (P::AwaitingInput | P::ActuationComplete, E::GameEnded) => P::GameOver,
            (P::Error, E::OperatorReset) => P::AwaitingInput,
            (P::AwaitingInput | P::GameOver, E::NewGame) => P::AwaitingInput,
            (phase, event) => return Err(TransitionError { phase, event }),
        };
        Ok(next)
    }

    /// Phases in which the board store may commit an approved move.
    #[inline]
    pub fn permits_apply(self) -> bool {
        matches!(self, TurnPhase::Validating | TurnPhase::AwaitingActuation)
    }

    #[inline]
    pub fn accepts_moves(self) -> bool {
        self == TurnPhase::AwaitingInput
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::AwaitingInput => "awaiting_input",
            TurnPhase::Validating => "validating",
            TurnPhase::AwaitingActuation => "awaiting_actuation",
            TurnPhase::ActuationComplete => "actuation_complete",
            TurnPhase::Error => "error",
            TurnPhase::GameOver => "game_over",
        };
        f.write_str(name)
    }
}
