//! Board controllers announce themselves with `register` and keep their
//! record alive with `heartbeat`. A board that has not been seen for longer
//! than the heartbeat timeout counts as gone and may register again; its
//! assigned game survives the re-registration.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerRecord {
    pub board_id: String,
    pub board_version: String,
    pub last_seen: DateTime<Utc>,
    pub game_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ControllerRegistry {
    heartbeat_timeout: TimeDelta,
    controllers: BTreeMap<String, ControllerRecord>,
}

impl ControllerRegistry {
    pub fn new(heartbeat_timeout: TimeDelta) -> Self {
        Self {
            heartbeat_timeout,
            controllers: BTreeMap::new(),
        }
    }

    pub fn heartbeat_timeout(&self) -> TimeDelta {
        self.heartbeat_timeout
    }

    pub fn register(&mut self, board_id: &str, board_version: &str) -> Result<&ControllerRecord, RegistryError> {
        self.register_at(board_id, board_version, Utc::now())
    }

    pub fn register_at(
        &mut self,
        board_id: &str,
        board_version: &str,
        now: DateTime<Utc>,
    ) -> Result<&ControllerRecord, RegistryError> {
        if self.is_active_at(board_id, now) {
            debug!(board_id, "registration refused, controller still active");
            return Err(RegistryError::AlreadyActive(board_id.to_owned()));
        }

        let game_id = self.controllers.get(board_id).and_then(|record| record.game_id.clone());
        info!(board_id, board_version, ?game_id, "controller registered");
        self.controllers.insert(
            board_id.to_owned(),
            ControllerRecord {
                board_id: board_id.to_owned(),
                board_version: board_version.to_owned(),
                last_seen: now,
                game_id,
            },
        );
        self.get(board_id)
            .ok_or_else(|| RegistryError::UnknownController(board_id.to_owned()))
    }

    pub fn heartbeat(&mut self, board_id: &str) -> Result<(), RegistryError> {
        self.heartbeat_at(board_id, Utc::now())
    }

    /// Refresh `last_seen`. A controller that already timed out has to
    /// register again.
    pub fn heartbeat_at(&mut self, board_id: &str, now: DateTime<Utc>) -> Result<(), RegistryError> {
        let timeout = self.heartbeat_timeout;
        let record = self
            .controllers
            .get_mut(board_id)
            .ok_or_else(|| RegistryError::UnknownController(board_id.to_owned()))?;
        if now - record.last_seen > timeout {
            return Err(RegistryError::NotActive(board_id.to_owned()));
        }
        record.last_seen = now;
        Ok(())
    }

    pub fn is_active(&self, board_id: &str) -> bool {
        self.is_active_at(board_id, Utc::now())
    }

    pub fn is_active_at(&self, board_id: &str, now: DateTime<Utc>) -> bool {
        self.controllers
            .get(board_id)
            .is_some_and(|record| now - record.last_seen <= self.heartbeat_timeout)
    }

    pub fn assign_game(&mut self, board_id: &str, game_id: Option<String>) -> Result<(), RegistryError> {
        let record = self
            .controllers
            .get_mut(board_id)
            .ok_or_else(|| RegistryError::UnknownController(board_id.to_owned()))?;
        info!(board_id, ?game_id, "game assignment changed");
        record.game_id = game_id;
        Ok(())
    }

    pub fn get(&self, board_id: &str) -> Option<&ControllerRecord> {
        self.controllers.get(board_id)
    }

    pub fn list(&self) -> impl Iterator<Item = &ControllerRecord> {
        self.controllers.values()
    }
}
