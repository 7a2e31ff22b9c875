//! In-process stand-in for the arm controller.
//!
//! Sleeps for a configurable motion time per primitive and can be scripted to
//! fail the next attempts, which drives the console demo and the dispatcher
//! and session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::actuation::actuation_command::ActuationCommand;
use crate::actuation::actuator::{Actuator, ActuatorError};

#[derive(Debug, Default)]
struct ArmLog {
    scripted: VecDeque<ActuatorError>,
    attempts: u32,
    executed: Vec<ActuationCommand>,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedArm {
    motion_per_primitive: Duration,
    log: Arc<Mutex<ArmLog>>,
}

impl SimulatedArm {
    pub fn new(motion_per_primitive: Duration) -> Self {
        Self {
            motion_per_primitive,
            log: Arc::default(),
        }
    }

    /// Queue an error for the next attempt. Queued errors are consumed in order.
    pub fn fail_next(&self, error: ActuatorError) {
        if let Ok(mut log) = self.log.lock() {
            log.scripted.push_back(error);
        }
    }

    /// Every attempt made so far, successful or not.
    pub fn attempts(&self) -> u32 {
        self.log.lock().map(|log| log.attempts).unwrap_or_default()
    }

    /// Commands that ran to completion.
    pub fn executed(&self) -> Vec<ActuationCommand> {
        self.log.lock().map(|log| log.executed.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Actuator for SimulatedArm {
    async fn execute(&self, command: &ActuationCommand) -> Result<(), ActuatorError> {
        let scripted = {
            let mut log = self
                .log
                .lock()
                .map_err(|_| ActuatorError::Rejected("simulated arm state poisoned".to_owned()))?;
            log.attempts += 1;
            log.scripted.pop_front()
        };

        let steps = u32::try_from(command.primitives.len()).unwrap_or(u32::MAX);
        tokio::time::sleep(self.motion_per_primitive.saturating_mul(steps)).await;

        if let Some(error) = scripted {
            debug!(command_id = command.id, %error, "simulated arm failing on script");
            return Err(error);
        }

        if let Ok(mut log) = self.log.lock() {
            log.executed.push(command.clone());
        }
        debug!(command_id = command.id, steps, "simulated arm finished command");
        Ok(())
    }
}
