//! Turn Coordinator.
//!
//! Owns the `GameState` and the `TurnPhase` of one session and sequences a
//! move through validation, optional actuation and completion. Every phase
//! change goes through `TurnPhase::transition`; the store is only written
//! while the phase permits it. The coordinator itself is synchronous: the
//! async `GameSession` drives the arm and feeds acknowledgements back here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::actuation::actuation_command::ActuationCommand;
use crate::actuation::command_dispatcher::AckOutcome;
use crate::coordinator::actuation_policy::ActuationPolicy;
use crate::coordinator::game_clock::GameClock;
use crate::coordinator::turn_phase::{TurnEvent, TurnPhase};
use crate::errors::{ActuationFailure, CoordinatorError};
use crate::game_state::chess_types::{Color, Piece};
use crate::game_state::game_state::GameState;
use crate::game_state::game_status::{GameResult, TerminalStatus};
use crate::move_generation::legal_move_generator::legal_moves;
use crate::move_generation::move_validator::{validate, LegalMove};
use crate::moves::chess_move::Move;
use crate::utils::pgn::write_pgn;

/// What happened to a submitted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The move was committed straight away.
    Applied(MoveReport),
    /// The arm has to perform the move before it is committed.
    AwaitingActuation(ActuationCommand),
}

/// Summary of a committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub side: Color,
    pub lan: String,
    pub captured: Option<Piece>,
    pub gives_check: bool,
    pub status: TerminalStatus,
    pub fen: String,
}

/// Read-only view of a session, published after every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: TurnPhase,
    pub side_to_move: Color,
    pub fen: String,
    pub ply: usize,
    pub in_check: bool,
    pub terminal: TerminalStatus,
    pub result: Option<GameResult>,
    pub draw_offer: Option<Color>,
    pub last_move: Option<String>,
    pub pending_command: Option<ActuationCommand>,
    pub fault: Option<String>,
    /// Remaining times as of the moment the status was taken.
    pub clock: Option<GameClock>,
}

#[derive(Debug, Clone)]
struct PendingMove {
    legal: LegalMove,
    command: ActuationCommand,
}

#[derive(Debug, Clone)]
pub struct TurnCoordinator {
    game: GameState,
    phase: TurnPhase,
    policy: ActuationPolicy,
    pending: Option<PendingMove>,
    result: Option<GameResult>,
    draw_offer: Option<Color>,
    clock: Option<GameClock>,
    fault: Option<String>,
    invariant_broken: bool,
    next_command_id: u64,
}

impl TurnCoordinator {
    pub fn new(policy: ActuationPolicy) -> Self {
        Self::with_game(GameState::new_game(), policy)
    }

    pub fn with_game(game: GameState, policy: ActuationPolicy) -> Self {
        let mut coordinator = Self {
            game,
            phase: TurnPhase::AwaitingInput,
            policy,
            pending: None,
            result: None,
            draw_offer: None,
            clock: None,
            fault: None,
            invariant_broken: false,
            next_command_id: 1,
        };
        coordinator.end_if_terminal();
        coordinator
    }

    /// Play under time control. `None` leaves the game untimed.
    pub fn with_clock(mut self, clock: Option<GameClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Rebuild a coordinator from persisted parts. A game saved while a
    /// command was in flight comes back in `Error`: nobody knows how far the
    /// arm got, so an operator has to reconcile the board first.
    pub fn restore(
        game: GameState,
        saved_phase: TurnPhase,
        result: Option<GameResult>,
        draw_offer: Option<Color>,
        clock: Option<GameClock>,
        policy: ActuationPolicy,
    ) -> Self {
        let now = Utc::now();
        let mut coordinator = Self::with_game(game, policy).with_clock(clock.map(|clock| clock.resumed_at(now)));
        if result.is_some() {
            coordinator.result = result;
            coordinator.phase = TurnPhase::GameOver;
        }
        if coordinator.result.is_some() {
            return coordinator;
        }
        coordinator.draw_offer = draw_offer;

        match saved_phase {
            TurnPhase::AwaitingActuation => {
                coordinator.phase = TurnPhase::Error;
                coordinator.fault = Some("restored while a move was being actuated".to_owned());
                warn!("restored session was mid-actuation, operator reset required");
            }
            TurnPhase::Error => {
                coordinator.phase = TurnPhase::Error;
                coordinator.fault = Some("restored in error state".to_owned());
            }
            _ => {}
        }
        coordinator
    }

    #[inline]
    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[inline]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[inline]
    pub fn policy(&self) -> ActuationPolicy {
        self.policy
    }

    #[inline]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    #[inline]
    pub fn draw_offer(&self) -> Option<Color> {
        self.draw_offer
    }

    #[inline]
    pub fn clock(&self) -> Option<&GameClock> {
        self.clock.as_ref()
    }

    pub fn pending_command(&self) -> Option<&ActuationCommand> {
        self.pending.as_ref().map(|pending| &pending.command)
    }

    /// Submit a move for the side to move.
    pub fn submit_move(&mut self, mv: Move) -> Result<SubmitOutcome, CoordinatorError> {
        self.submit_move_for(self.game.side_to_move(), mv)
    }

    /// Submit a move on behalf of `side`, e.g. as reported by the vision
    /// subsystem. A move for the wrong side is rejected by the validator.
    pub fn submit_move_for(&mut self, side: Color, mv: Move) -> Result<SubmitOutcome, CoordinatorError> {
        self.ensure_accepts("submit_move")?;
        if let Some(result) = self.check_clock_at(Utc::now()) {
            return Err(CoordinatorError::GameOver(result));
        }
        self.advance(TurnEvent::Submit)?;

        let legal = match validate(&self.game, side, mv) {
            Ok(legal) => legal,
            Err(reason) => {
                self.advance(TurnEvent::Reject)?;
                debug!(%side, lan = %mv, %reason, "move rejected");
                return Err(reason.into());
            }
        };

        if self.policy.requires_actuation(side) {
            let command = ActuationCommand::for_move(self.next_command_id, &legal);
            self.next_command_id += 1;
            self.advance(TurnEvent::ApproveWithActuation)?;
            info!(%side, lan = %mv, command = %command, "move approved, awaiting actuation");
            self.pending = Some(PendingMove {
                legal,
                command: command.clone(),
            });
            return Ok(SubmitOutcome::AwaitingActuation(command));
        }

        let report = self.commit(&legal)?;
        self.advance(TurnEvent::ApproveWithoutActuation)?;
        self.end_if_terminal();
        Ok(SubmitOutcome::Applied(report))
    }

    /// Feed back what the dispatcher reported for the in-flight command.
    /// The move is committed only on success; on failure the board is left
    /// as it was and the session waits for an operator reset.
    pub fn on_actuation_ack(&mut self, outcome: AckOutcome) -> Result<MoveReport, CoordinatorError> {
        if self.phase != TurnPhase::AwaitingActuation {
            return Err(CoordinatorError::NoActuationInFlight);
        }
        let Some(pending) = self.pending.take() else {
            return Err(CoordinatorError::NoActuationInFlight);
        };

        let failure = match outcome {
            AckOutcome::Success => {
                let report = self.commit(&pending.legal)?;
                self.advance(TurnEvent::AckSuccess)?;
                info!(command_id = pending.command.id, lan = %report.lan, "actuation acknowledged, move committed");
                return Ok(report);
            }
            AckOutcome::Failure(failure) => failure,
            AckOutcome::Timeout => ActuationFailure::Timeout,
        };

        self.advance(TurnEvent::AckFailure)?;
        self.fault = Some(failure.to_string());
        warn!(command_id = pending.command.id, %failure, "actuation failed, board state unchanged");
        Err(CoordinatorError::ActuationFailed(failure))
    }

    /// Hand the turn over once the arm has finished.
    pub fn on_actuation_complete(&mut self) -> Result<TerminalStatus, CoordinatorError> {
        if self.phase != TurnPhase::ActuationComplete {
            return Err(CoordinatorError::WrongPhase {
                operation: "on_actuation_complete",
                phase: self.phase,
            });
        }

        let status = self.game.is_terminal();
        match self.settled_result() {
            Some(result) => self.finish(result)?,
            None => self.advance(TurnEvent::Complete)?,
        }
        Ok(status)
    }

    /// End the game when the side to move has used up its time. Returns the
    /// result when the flag fell. Only checked while input is awaited; a
    /// move being actuated is charged when it is committed.
    pub fn check_clock(&mut self) -> Option<GameResult> {
        self.check_clock_at(Utc::now())
    }

    pub fn check_clock_at(&mut self, now: DateTime<Utc>) -> Option<GameResult> {
        if self.result.is_some() || !self.phase.accepts_moves() {
            return None;
        }
        let side = self.game.side_to_move();
        let clock = self.clock.as_mut().filter(|clock| clock.flag_fallen_at(side, now))?;
        clock.stop_at(side, now);

        let result = GameResult::TimeForfeit {
            winner: side.opposite(),
        };
        warn!(%side, "flag fell");
        if let Err(err) = self.finish(result) {
            self.fail(err.to_string());
        }
        Some(result)
    }

    /// Operator abort of the in-flight command. The arm stops where it is.
    pub fn abort_actuation(&mut self) -> Result<(), CoordinatorError> {
        if self.phase != TurnPhase::AwaitingActuation {
            return Err(CoordinatorError::NoActuationInFlight);
        }
        self.advance(TurnEvent::Abort)?;
        let command_id = self.pending.take().map(|pending| pending.command.id);
        self.fault = Some(ActuationFailure::Aborted.to_string());
        warn!(?command_id, "actuation aborted by operator");
        Ok(())
    }

    /// Leave `Error` once the operator has reconciled the physical board.
    /// After an invariant violation the game cannot be trusted and a fresh
    /// game is started instead.
    pub fn operator_reset(&mut self) -> Result<(), CoordinatorError> {
        if self.phase != TurnPhase::Error {
            return Err(CoordinatorError::WrongPhase {
                operation: "operator_reset",
                phase: self.phase,
            });
        }

        self.advance(TurnEvent::OperatorReset)?;
        self.pending = None;
        let fault = self.fault.take();
        if self.invariant_broken {
            self.invariant_broken = false;
            self.game = GameState::new_game();
            self.result = None;
            self.draw_offer = None;
            self.reset_clock();
            warn!(?fault, "session discarded after invariant violation, new game started");
        } else {
            info!(?fault, "operator reset, resuming game");
        }
        self.end_if_terminal();
        Ok(())
    }

    /// Replace the game with a new one from `fen` (standard start when `None`).
    pub fn new_game(&mut self, fen: Option<&str>) -> Result<(), CoordinatorError> {
        if self.phase == TurnPhase::Error {
            return Err(CoordinatorError::RequiresOperatorReset);
        }
        let game = match fen {
            Some(fen) => GameState::from_fen(fen)?,
            None => GameState::new_game(),
        };

        self.advance(TurnEvent::NewGame)?;
        self.game = game;
        self.result = None;
        self.draw_offer = None;
        self.pending = None;
        self.reset_clock();
        info!(fen = %self.game.to_fen(), "new game started");
        self.end_if_terminal();
        Ok(())
    }

    pub fn resign(&mut self, side: Color) -> Result<GameResult, CoordinatorError> {
        self.ensure_accepts("resign")?;
        let result = GameResult::Resigned {
            winner: side.opposite(),
        };
        self.finish(result)?;
        Ok(result)
    }

    /// Offer a draw. Offering while the opponent's offer stands is an agreement.
    pub fn offer_draw(&mut self, side: Color) -> Result<Option<GameResult>, CoordinatorError> {
        self.ensure_accepts("offer_draw")?;
        match self.draw_offer {
            Some(offered_by) if offered_by == side => Err(CoordinatorError::DrawAlreadyOffered(side)),
            Some(_) => {
                self.finish(GameResult::DrawAgreed)?;
                Ok(Some(GameResult::DrawAgreed))
            }
            None => {
                self.draw_offer = Some(side);
                info!(%side, "draw offered");
                Ok(None)
            }
        }
    }

    /// Answer the opponent's pending draw offer.
    pub fn respond_draw(&mut self, side: Color, accept: bool) -> Result<Option<GameResult>, CoordinatorError> {
        self.ensure_accepts("respond_draw")?;
        if self.draw_offer != Some(side.opposite()) {
            return Err(CoordinatorError::NoDrawOffer(side));
        }

        self.draw_offer = None;
        if accept {
            self.finish(GameResult::DrawAgreed)?;
            Ok(Some(GameResult::DrawAgreed))
        } else {
            info!(%side, "draw offer declined");
            Ok(None)
        }
    }

    /// Take back the last ply. The physical board has to be reset by hand.
    pub fn take_back(&mut self) -> Result<Move, CoordinatorError> {
        self.ensure_accepts("take_back")?;
        let last = self
            .game
            .history()
            .last()
            .map(|entry| entry.mv)
            .ok_or(CoordinatorError::NothingToTakeBack)?;
        let earlier = self.game.undo_last().ok_or(CoordinatorError::NothingToTakeBack)??;

        self.game = earlier;
        self.draw_offer = None;
        info!(lan = %last, "move taken back");
        Ok(last)
    }

    /// Legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.result.is_some() {
            return Vec::new();
        }
        legal_moves(&self.game).iter().map(LegalMove::mv).collect()
    }

    pub fn pgn(&self) -> String {
        write_pgn(&self.game, self.result)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            side_to_move: self.game.side_to_move(),
            fen: self.game.to_fen(),
            ply: self.game.history().len(),
            in_check: self.game.is_in_check(),
            terminal: self.game.is_terminal(),
            result: self.result,
            draw_offer: self.draw_offer,
            last_move: self.game.history().last().map(|entry| entry.lan.clone()),
            pending_command: self.pending_command().cloned(),
            fault: self.fault.clone(),
            clock: self.settled_clock(),
        }
    }

    /// The clock charged up to now, as published in status and snapshots.
    pub fn settled_clock(&self) -> Option<GameClock> {
        let side = self.game.side_to_move();
        self.clock.map(|clock| clock.settled_at(side, Utc::now()))
    }

    fn ensure_accepts(&self, operation: &'static str) -> Result<(), CoordinatorError> {
        if let Some(result) = self.result {
            debug!(operation, %result, "refused, game is over");
            return Err(CoordinatorError::GameOver(result));
        }
        if self.phase.accepts_moves() {
            return Ok(());
        }
        match self.phase {
            TurnPhase::Error => Err(CoordinatorError::RequiresOperatorReset),
            phase => Err(CoordinatorError::WrongPhase { operation, phase }),
        }
    }

    fn advance(&mut self, event: TurnEvent) -> Result<(), CoordinatorError> {
        let next = self.phase.transition(event)?;
        debug!(from = %self.phase, to = %next, ?event, "turn phase transition");
        self.phase = next;
        Ok(())
    }

    fn commit(&mut self, legal: &LegalMove) -> Result<MoveReport, CoordinatorError> {
        let next = match self.game.apply_move(self.phase, legal) {
            Ok(next) => next,
            Err(err) => {
                self.fail(err.to_string());
                return Err(err.into());
            }
        };
        if let Err(violation) = next.verify_invariants() {
            error!(%violation, "invariant violated after applying move");
            self.invariant_broken = true;
            self.fail(violation.to_string());
            return Err(violation.into());
        }

        let side = legal.moved().color;
        if let Some(clock) = &mut self.clock {
            if !clock.press_at(side, Utc::now()) {
                warn!(%side, "move completed after the flag fell");
            }
        }
        self.game = next;
        if self.draw_offer == Some(side.opposite()) {
            debug!(%side, "pending draw offer lapsed");
            self.draw_offer = None;
        }

        let report = MoveReport {
            side,
            lan: legal.mv().to_lan(),
            captured: legal.captured().map(|(_, piece)| piece),
            gives_check: legal.gives_check(),
            status: self.game.is_terminal(),
            fen: self.game.to_fen(),
        };
        info!(%side, lan = %report.lan, fen = %report.fen, "move committed");
        Ok(report)
    }

    fn fail(&mut self, fault: String) {
        self.pending = None;
        self.fault = Some(fault);
        if let Ok(next) = self.phase.transition(TurnEvent::Fault) {
            self.phase = next;
        }
    }

    fn finish(&mut self, result: GameResult) -> Result<(), CoordinatorError> {
        self.advance(TurnEvent::GameEnded)?;
        self.result = Some(result);
        self.draw_offer = None;
        let side = self.game.side_to_move();
        if let Some(clock) = &mut self.clock {
            clock.stop_at(side, Utc::now());
        }
        info!(%result, "game over");
        Ok(())
    }

    fn end_if_terminal(&mut self) {
        if self.phase != TurnPhase::AwaitingInput {
            return;
        }
        if let Some(result) = self.settled_result() {
            if self.finish(result).is_err() {
                self.fail(format!("could not end game on {result}"));
            }
        }
    }

    /// How the game ends after the last commit, if it does. A mover whose
    /// flag fell before the move landed loses on time even if the move
    /// itself ended the game.
    fn settled_result(&self) -> Option<GameResult> {
        let mover = self.game.side_to_move().opposite();
        if self.clock.is_some_and(|clock| clock.is_flagged(mover)) {
            return Some(GameResult::TimeForfeit {
                winner: mover.opposite(),
            });
        }
        let status = self.game.is_terminal();
        status.is_over().then(|| status.into())
    }

    fn reset_clock(&mut self) {
        if let Some(clock) = &mut self.clock {
            clock.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::{SubmitOutcome, TurnCoordinator};
    use crate::actuation::actuation_command::ArmPrimitive;
    use crate::actuation::command_dispatcher::AckOutcome;
    use crate::coordinator::actuation_policy::ActuationPolicy;
    use crate::coordinator::game_clock::GameClock;
    use crate::coordinator::turn_phase::TurnPhase;
    use crate::errors::{ActuationFailure, CoordinatorError, IllegalMoveReason};
    use crate::game_state::chess_types::Color;
    use crate::game_state::game_status::{GameResult, TerminalStatus};
    use crate::moves::chess_move::Move;

    fn lan(text: &str) -> Move {
        text.parse().expect("test move should parse")
    }

    fn play_all(coordinator: &mut TurnCoordinator, moves: &[&str]) {
        for text in moves {
            match coordinator.submit_move(lan(text)).expect("test move should be accepted") {
                SubmitOutcome::Applied(_) => {}
                SubmitOutcome::AwaitingActuation(command) => panic!("unexpected actuation {command}"),
            }
        }
    }

    #[test]
    fn accepts_opening_pawn_push() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        let outcome = coordinator.submit_move(lan("e2e4")).expect("e2e4 should be accepted");

        let SubmitOutcome::Applied(report) = outcome else {
            panic!("manual policy should apply immediately");
        };
        assert_eq!(report.side, Color::Light);
        assert_eq!(report.status, TerminalStatus::None);
        assert_eq!(coordinator.game().side_to_move(), Color::Dark);
        assert_eq!(coordinator.game().history().len(), 1);
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingInput);
    }

    #[test]
    fn rejects_unreachable_destination_without_touching_state() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        let before = coordinator.game().clone();

        let err = coordinator.submit_move(lan("e2e5")).expect_err("e2e5 should be rejected");
        assert_eq!(err, CoordinatorError::IllegalMove(IllegalMoveReason::BlockedPath));
        assert_eq!(coordinator.game(), &before);
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingInput);
    }

    #[test]
    fn castling_after_king_moved_is_invalid() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        play_all(
            &mut coordinator,
            &["e2e4", "e7e5", "g1f3", "g8f6", "f1c4", "f8c5", "e1f1", "e8f8", "f1e1", "f8e8"],
        );

        let err = coordinator.submit_move(lan("e1g1")).expect_err("castling should be refused");
        assert_eq!(err, CoordinatorError::IllegalMove(IllegalMoveReason::InvalidCastle));
    }

    #[test]
    fn checkmate_freezes_the_session() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        play_all(&mut coordinator, &["f2f3", "e7e5", "g2g4", "d8h4"]);

        let mate = GameResult::Terminal {
            status: TerminalStatus::Checkmate { winner: Color::Dark },
        };
        assert_eq!(coordinator.phase(), TurnPhase::GameOver);
        assert_eq!(coordinator.result(), Some(mate));
        assert!(coordinator.legal_moves().is_empty());

        for text in ["e1f2", "a2a3", "h2h4"] {
            assert_eq!(
                coordinator.submit_move(lan(text)),
                Err(CoordinatorError::GameOver(mate))
            );
        }
        assert!(coordinator.pgn().contains("0-1"));
    }

    #[test]
    fn actuated_move_is_committed_only_after_acknowledgement() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::default());
        play_all(&mut coordinator, &["e2e4"]);
        let before = coordinator.game().clone();

        let outcome = coordinator.submit_move(lan("e7e5")).expect("e7e5 should be accepted");
        let SubmitOutcome::AwaitingActuation(command) = outcome else {
            panic!("dark moves should be actuated by default");
        };
        assert_eq!(command.id, 1);
        assert_eq!(
            command.primitives,
            vec![ArmPrimitive::PickUp { square: 52 }, ArmPrimitive::Place { square: 36 }]
        );
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingActuation);
        assert_eq!(coordinator.game(), &before);

        assert_eq!(
            coordinator.submit_move(lan("d2d4")),
            Err(CoordinatorError::WrongPhase {
                operation: "submit_move",
                phase: TurnPhase::AwaitingActuation
            })
        );

        let report = coordinator
            .on_actuation_ack(AckOutcome::Success)
            .expect("ack should commit the move");
        assert_eq!(report.lan, "e7e5");
        assert_eq!(coordinator.phase(), TurnPhase::ActuationComplete);

        assert_eq!(coordinator.on_actuation_complete(), Ok(TerminalStatus::None));
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingInput);
        assert_eq!(coordinator.game().side_to_move(), Color::Light);
    }

    #[test]
    fn failed_actuation_requires_operator_reset() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::from_sides(&[Color::Light]));
        let before = coordinator.game().clone();
        coordinator.submit_move(lan("e2e4")).expect("e2e4 should be accepted");

        assert_eq!(
            coordinator.on_actuation_ack(AckOutcome::Timeout),
            Err(CoordinatorError::ActuationFailed(ActuationFailure::Timeout))
        );
        assert_eq!(coordinator.phase(), TurnPhase::Error);
        assert_eq!(coordinator.game(), &before);
        assert!(coordinator.status().fault.is_some());

        assert_eq!(coordinator.submit_move(lan("e2e4")), Err(CoordinatorError::RequiresOperatorReset));
        assert_eq!(coordinator.new_game(None), Err(CoordinatorError::RequiresOperatorReset));

        coordinator.operator_reset().expect("reset should leave error");
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingInput);
        assert_eq!(coordinator.game(), &before);
        assert!(coordinator.status().fault.is_none());
    }

    #[test]
    fn abort_leaves_board_untouched() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::from_sides(&[Color::Light]));
        coordinator.submit_move(lan("g1f3")).expect("g1f3 should be accepted");

        coordinator.abort_actuation().expect("abort should succeed");
        assert_eq!(coordinator.phase(), TurnPhase::Error);
        assert!(coordinator.game().history().is_empty());
        assert_eq!(coordinator.abort_actuation(), Err(CoordinatorError::NoActuationInFlight));
        assert_eq!(
            coordinator.on_actuation_ack(AckOutcome::Success),
            Err(CoordinatorError::NoActuationInFlight)
        );
    }

    #[test]
    fn draw_offer_can_be_accepted_declined_or_lapse() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        assert_eq!(coordinator.offer_draw(Color::Light), Ok(None));
        assert_eq!(
            coordinator.offer_draw(Color::Light),
            Err(CoordinatorError::DrawAlreadyOffered(Color::Light))
        );
        assert_eq!(coordinator.respond_draw(Color::Dark, false), Ok(None));
        assert_eq!(
            coordinator.respond_draw(Color::Dark, true),
            Err(CoordinatorError::NoDrawOffer(Color::Dark))
        );

        coordinator.offer_draw(Color::Light).expect("offer should be recorded");
        play_all(&mut coordinator, &["e2e4", "e7e5"]);
        assert_eq!(coordinator.draw_offer(), None);

        coordinator.offer_draw(Color::Light).expect("offer should be recorded");
        assert_eq!(coordinator.respond_draw(Color::Dark, true), Ok(Some(GameResult::DrawAgreed)));
        assert_eq!(coordinator.phase(), TurnPhase::GameOver);
        assert!(coordinator.pgn().contains("1/2-1/2"));
    }

    #[test]
    fn resignation_ends_the_game_and_new_game_restarts() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        play_all(&mut coordinator, &["d2d4"]);

        let result = coordinator.resign(Color::Dark).expect("resign should succeed");
        assert_eq!(result, GameResult::Resigned { winner: Color::Light });
        assert_eq!(coordinator.resign(Color::Light), Err(CoordinatorError::GameOver(result)));

        coordinator.new_game(None).expect("new game should start");
        assert_eq!(coordinator.phase(), TurnPhase::AwaitingInput);
        assert_eq!(coordinator.result(), None);
        assert!(coordinator.game().history().is_empty());
    }

    #[test]
    fn take_back_restores_previous_position() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        assert_eq!(coordinator.take_back(), Err(CoordinatorError::NothingToTakeBack));

        play_all(&mut coordinator, &["e2e4", "c7c5"]);
        let after_first = {
            let mut reference = TurnCoordinator::new(ActuationPolicy::manual());
            play_all(&mut reference, &["e2e4"]);
            reference.game().to_fen()
        };

        assert_eq!(coordinator.take_back(), Ok(lan("c7c5")));
        assert_eq!(coordinator.game().to_fen(), after_first);
        assert_eq!(coordinator.game().history().len(), 1);
    }

    #[test]
    fn new_game_from_mated_position_is_over_at_once() {
        let mut coordinator = TurnCoordinator::new(ActuationPolicy::manual());
        coordinator
            .new_game(Some("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1"))
            .expect("fen should load");
        assert_eq!(coordinator.phase(), TurnPhase::GameOver);
        assert_eq!(
            coordinator.result(),
            Some(GameResult::Terminal {
                status: TerminalStatus::Checkmate { winner: Color::Light }
            })
        );
    }

    #[test]
    fn restore_mid_actuation_enters_error() {
        let coordinator = TurnCoordinator::restore(
            crate::game_state::game_state::GameState::new_game(),
            TurnPhase::AwaitingActuation,
            None,
            None,
            None,
            ActuationPolicy::default(),
        );
        assert_eq!(coordinator.phase(), TurnPhase::Error);
        assert!(coordinator.pending_command().is_none());
    }

    fn timed(policy: ActuationPolicy, allowance: TimeDelta) -> TurnCoordinator {
        TurnCoordinator::new(policy).with_clock(Some(GameClock::new(allowance)))
    }

    /// Pretend the side to move started thinking `ago` before now.
    fn backdate_turn(coordinator: &mut TurnCoordinator, ago: TimeDelta) {
        if let Some(clock) = coordinator.clock.as_mut() {
            clock.running_since = Some(Utc::now() - ago);
        }
    }

    #[test]
    fn clock_runs_down_to_a_time_forfeit() {
        let mut coordinator = timed(ActuationPolicy::manual(), TimeDelta::minutes(1));
        assert_eq!(coordinator.check_clock_at(Utc::now() + TimeDelta::hours(1)), None);

        play_all(&mut coordinator, &["e2e4"]);
        let started = coordinator
            .clock()
            .and_then(|clock| clock.running_since)
            .expect("first move should start the clock");
        assert_eq!(coordinator.check_clock_at(started + TimeDelta::seconds(30)), None);

        let forfeit = GameResult::TimeForfeit { winner: Color::Light };
        assert_eq!(coordinator.check_clock_at(started + TimeDelta::minutes(2)), Some(forfeit));
        assert_eq!(coordinator.phase(), TurnPhase::GameOver);
        assert_eq!(coordinator.submit_move(lan("e7e5")), Err(CoordinatorError::GameOver(forfeit)));
        assert!(coordinator.pgn().contains("1-0"));

        let status = coordinator.status();
        assert_eq!(status.result, Some(forfeit));
        let clock = status.clock.expect("status should carry the clock");
        assert!(!clock.is_running());
        assert!(clock.is_flagged(Color::Dark));
        assert_eq!(clock.remaining(Color::Light), TimeDelta::minutes(1));

        coordinator.new_game(None).expect("new game should start");
        assert_eq!(coordinator.clock().copied(), Some(GameClock::new(TimeDelta::minutes(1))));
    }

    #[test]
    fn move_submitted_after_the_flag_is_refused() {
        let mut coordinator = timed(ActuationPolicy::manual(), TimeDelta::minutes(1));
        play_all(&mut coordinator, &["d2d4"]);
        backdate_turn(&mut coordinator, TimeDelta::minutes(2));

        assert_eq!(
            coordinator.submit_move(lan("d7d5")),
            Err(CoordinatorError::GameOver(GameResult::TimeForfeit { winner: Color::Light }))
        );
        assert_eq!(coordinator.game().history().len(), 1);
    }

    #[test]
    fn actuated_move_landing_after_the_flag_loses_on_time() {
        let mut coordinator = timed(ActuationPolicy::default(), TimeDelta::minutes(1));
        play_all(&mut coordinator, &["e2e4"]);
        coordinator.submit_move(lan("e7e5")).expect("e7e5 should be accepted");
        backdate_turn(&mut coordinator, TimeDelta::minutes(2));

        let report = coordinator
            .on_actuation_ack(AckOutcome::Success)
            .expect("the arm finished, so the move is committed");
        assert_eq!(report.status, TerminalStatus::None);
        assert_eq!(coordinator.on_actuation_complete(), Ok(TerminalStatus::None));

        assert_eq!(coordinator.game().history().len(), 2);
        assert_eq!(coordinator.phase(), TurnPhase::GameOver);
        assert_eq!(coordinator.result(), Some(GameResult::TimeForfeit { winner: Color::Light }));
    }
}
