//! Device contract for the robot arm.

use async_trait::async_trait;
use thiserror::Error;

use crate::actuation::actuation_command::ActuationCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Worth retrying: a missed grip, a bus hiccup, a busy controller.
    #[error("transient actuator error: {0}")]
    Transient(String),
    /// The controller refused the command; retrying cannot help.
    #[error("actuator rejected the command: {0}")]
    Rejected(String),
}

/// Executes one command to completion. Implementations must tolerate being
/// dropped mid-execution when the dispatcher times out or aborts.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn execute(&self, command: &ActuationCommand) -> Result<(), ActuatorError>;
}
