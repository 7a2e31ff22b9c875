//! Command Dispatcher.
//!
//! `dispatch` hands a command to the actuator on a spawned task and returns at
//! once; `await_ack` waits for the outcome with a deadline. Transient actuator
//! errors are retried with exponential backoff and jitter, rejections are not.
//! A timeout or an abort cancels the task; motion already performed by the
//! arm is not reversed.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::actuation::actuation_command::ActuationCommand;
use crate::actuation::actuator::{Actuator, ActuatorError};
use crate::errors::ActuationFailure;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// Extra attempts after the first one for transient errors.
    pub max_retries: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
    /// Random extra delay as a fraction of the backoff delay (`0.2` = up to 20%).
    pub retry_jitter: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_initial_delay: Duration::from_millis(250),
            retry_max_delay: Duration::from_secs(2),
            retry_jitter: 0.2,
        }
    }
}

impl DispatchConfig {
    /// Delay before retry number `attempt` (1-based), jitter included.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let base = self
            .retry_initial_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay);

        if self.retry_jitter > 0.0 {
            let extra = rand::rng().random_range(0.0..=self.retry_jitter);
            base.mul_f64(1.0 + extra)
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Success,
    Failure(ActuationFailure),
    Timeout,
}

/// Operator-side handle that cancels an in-flight command.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    command_id: u64,
    token: CancellationToken,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn command_id(&self) -> u64 {
        self.command_id
    }
}

/// A dispatched command whose acknowledgement has not been collected yet.
#[derive(Debug)]
pub struct PendingActuation {
    command_id: u64,
    outcome: oneshot::Receiver<Result<u32, ActuationFailure>>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PendingActuation {
    pub fn command_id(&self) -> u64 {
        self.command_id
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            command_id: self.command_id,
            token: self.token.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CommandDispatcher {
    actuator: Arc<dyn Actuator>,
    config: DispatchConfig,
}

impl CommandDispatcher {
    pub fn new(actuator: Arc<dyn Actuator>, config: DispatchConfig) -> Self {
        Self { actuator, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Start executing `command`. Must be called inside a tokio runtime.
    pub fn dispatch(&self, command: ActuationCommand) -> PendingActuation {
        let (sender, outcome) = oneshot::channel();
        let token = CancellationToken::new();
        let command_id = command.id;

        let actuator = Arc::clone(&self.actuator);
        let config = self.config;
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let result = run_with_retries(actuator.as_ref(), &command, &config, &task_token).await;
            // The receiver is gone when the caller already timed out.
            let _ = sender.send(result);
        });

        info!(command_id, "actuation command dispatched");
        PendingActuation {
            command_id,
            outcome,
            token,
            task,
        }
    }

    /// Wait up to `timeout` for the arm to report. A timeout cancels the task.
    pub async fn await_ack(&self, mut pending: PendingActuation, timeout: Duration) -> AckOutcome {
        let command_id = pending.command_id;
        match tokio::time::timeout(timeout, &mut pending.outcome).await {
            Ok(Ok(Ok(attempts))) => {
                info!(command_id, attempts, "actuation acknowledged");
                AckOutcome::Success
            }
            Ok(Ok(Err(failure))) => {
                warn!(command_id, %failure, "actuation failed");
                AckOutcome::Failure(failure)
            }
            Ok(Err(_)) => {
                warn!(command_id, "actuation task dropped its result");
                AckOutcome::Failure(ActuationFailure::TaskLost)
            }
            Err(_) => {
                pending.token.cancel();
                pending.task.abort();
                warn!(command_id, timeout_ms = timeout.as_millis() as u64, "actuation timed out");
                AckOutcome::Timeout
            }
        }
    }
}

async fn run_with_retries(
    actuator: &dyn Actuator,
    command: &ActuationCommand,
    config: &DispatchConfig,
    token: &CancellationToken,
) -> Result<u32, ActuationFailure> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ActuationFailure::Aborted),
            result = actuator.execute(command) => result,
        };

        match result {
            Ok(()) => return Ok(attempt),
            Err(ActuatorError::Rejected(reason)) => return Err(ActuationFailure::Rejected(reason)),
            Err(ActuatorError::Transient(reason)) => {
                if attempt > config.max_retries {
                    return Err(ActuationFailure::RetriesExhausted {
                        attempts: attempt,
                        last_error: reason,
                    });
                }

                let delay = config.backoff_delay(attempt);
                warn!(
                    command_id = command.id,
                    error = %reason,
                    attempt,
                    retry_delay_ms = delay.as_millis() as u64,
                    "actuator attempt failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ActuationFailure::Aborted),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{AckOutcome, CommandDispatcher, DispatchConfig};
    use crate::actuation::actuation_command::{ActuationCommand, ArmPrimitive};
    use crate::actuation::actuator::ActuatorError;
    use crate::actuation::simulated_arm::SimulatedArm;
    use crate::errors::ActuationFailure;
    use crate::moves::chess_move::Move;

    fn command() -> ActuationCommand {
        ActuationCommand {
            id: 3,
            mv: Move::new(52, 36),
            primitives: vec![ArmPrimitive::PickUp { square: 52 }, ArmPrimitive::Place { square: 36 }],
        }
    }

    fn config(max_retries: u32) -> DispatchConfig {
        DispatchConfig {
            max_retries,
            retry_initial_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_millis(400),
            retry_jitter: 0.0,
        }
    }

    fn dispatcher(arm: &SimulatedArm, max_retries: u32) -> CommandDispatcher {
        CommandDispatcher::new(Arc::new(arm.clone()), config(max_retries))
    }

    #[tokio::test(start_paused = true)]
    async fn successful_command_is_acknowledged() {
        let arm = SimulatedArm::new(Duration::from_millis(50));
        let dispatcher = dispatcher(&arm, 0);
        let pending = dispatcher.dispatch(command());
        assert_eq!(pending.command_id(), 3);
        assert_eq!(dispatcher.await_ack(pending, Duration::from_secs(1)).await, AckOutcome::Success);
        assert_eq!(arm.executed(), vec![command()]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_until_success() {
        let arm = SimulatedArm::new(Duration::from_millis(10));
        arm.fail_next(ActuatorError::Transient("grip".to_owned()));
        arm.fail_next(ActuatorError::Transient("grip".to_owned()));
        let dispatcher = dispatcher(&arm, 2);

        let pending = dispatcher.dispatch(command());
        assert_eq!(dispatcher.await_ack(pending, Duration::from_secs(5)).await, AckOutcome::Success);
        assert_eq!(arm.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_the_last_error() {
        let arm = SimulatedArm::new(Duration::from_millis(10));
        arm.fail_next(ActuatorError::Transient("first".to_owned()));
        arm.fail_next(ActuatorError::Transient("second".to_owned()));
        let dispatcher = dispatcher(&arm, 1);

        let pending = dispatcher.dispatch(command());
        assert_eq!(
            dispatcher.await_ack(pending, Duration::from_secs(5)).await,
            AckOutcome::Failure(ActuationFailure::RetriesExhausted {
                attempts: 2,
                last_error: "second".to_owned()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_is_not_retried() {
        let arm = SimulatedArm::new(Duration::from_millis(10));
        arm.fail_next(ActuatorError::Rejected("square out of reach".to_owned()));
        let dispatcher = dispatcher(&arm, 3);

        let pending = dispatcher.dispatch(command());
        assert_eq!(
            dispatcher.await_ack(pending, Duration::from_secs(5)).await,
            AckOutcome::Failure(ActuationFailure::Rejected("square out of reach".to_owned()))
        );
        assert_eq!(arm.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_arm_times_out_and_is_cancelled() {
        let arm = SimulatedArm::new(Duration::from_secs(10));
        let dispatcher = dispatcher(&arm, 0);

        let pending = dispatcher.dispatch(command());
        assert_eq!(dispatcher.await_ack(pending, Duration::from_secs(1)).await, AckOutcome::Timeout);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(arm.executed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_reports_aborted() {
        let arm = SimulatedArm::new(Duration::from_secs(10));
        let dispatcher = dispatcher(&arm, 0);

        let pending = dispatcher.dispatch(command());
        let handle = pending.abort_handle();
        handle.abort();
        assert!(handle.is_aborted());
        assert_eq!(
            dispatcher.await_ack(pending, Duration::from_secs(60)).await,
            AckOutcome::Failure(ActuationFailure::Aborted)
        );
    }

    #[test]
    fn backoff_doubles_and_caps_without_jitter() {
        let config = config(5);
        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(config.backoff_delay(6), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_within_its_fraction() {
        let config = DispatchConfig {
            retry_jitter: 0.5,
            ..config(1)
        };
        for _ in 0..50 {
            let delay = config.backoff_delay(1);
            assert!(delay >= Duration::from_millis(100) && delay <= Duration::from_millis(150));
        }
    }
}
