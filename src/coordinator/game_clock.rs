//! Per-side game clock.
//!
//! Both sides start with the same allowance. The clock stays idle until the
//! first move is committed; from then on each commit charges the mover for
//! the time since the previous commit and starts the opponent's time.
//! Remaining times are kept in milliseconds so the clock serializes as-is
//! into snapshots and status updates.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::game_state::chess_types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    pub time_per_player_ms: i64,
    pub light_remaining_ms: i64,
    pub dark_remaining_ms: i64,
    /// Start of the current turn; `None` while the clock is stopped.
    pub running_since: Option<DateTime<Utc>>,
}

impl GameClock {
    pub fn new(time_per_player: TimeDelta) -> Self {
        let ms = time_per_player.num_milliseconds().max(0);
        Self {
            time_per_player_ms: ms,
            light_remaining_ms: ms,
            dark_remaining_ms: ms,
            running_since: None,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Remaining time of `side` as of the last commit.
    pub fn remaining(&self, side: Color) -> TimeDelta {
        millis(match side {
            Color::Light => self.light_remaining_ms,
            Color::Dark => self.dark_remaining_ms,
        })
    }

    /// Remaining time of `side` at `now`, counting the running turn when
    /// `side` is the one to move.
    pub fn remaining_at(&self, side: Color, to_move: Color, now: DateTime<Utc>) -> TimeDelta {
        let stored = self.remaining(side);
        match self.running_since {
            Some(since) if side == to_move => stored - (now - since).max(TimeDelta::zero()),
            _ => stored,
        }
    }

    /// Whether `side` has no time left after its last charged turn.
    #[inline]
    pub fn is_flagged(&self, side: Color) -> bool {
        self.remaining(side) <= TimeDelta::zero()
    }

    pub fn flag_fallen_at(&self, to_move: Color, now: DateTime<Utc>) -> bool {
        self.remaining_at(to_move, to_move, now) <= TimeDelta::zero()
    }

    /// Charge `side` for the move it just completed and start the opponent's
    /// time. Returns `false` when `side` ran out before completing it.
    pub fn press_at(&mut self, side: Color, now: DateTime<Utc>) -> bool {
        let left = self.charge(side, now);
        self.running_since = Some(now);
        left > TimeDelta::zero()
    }

    /// Charge the side to move up to `now` and stop.
    pub fn stop_at(&mut self, to_move: Color, now: DateTime<Utc>) {
        if self.is_running() {
            self.charge(to_move, now);
            self.running_since = None;
        }
    }

    /// The clock with the running turn charged up to `now`, still running
    /// from `now`. Used for status and snapshots.
    pub fn settled_at(&self, to_move: Color, now: DateTime<Utc>) -> Self {
        let mut settled = *self;
        if settled.is_running() {
            settled.press_at(to_move, now);
        }
        settled
    }

    /// Restart a restored clock at `now`, so the time the process was down
    /// is not charged to anyone.
    pub fn resumed_at(&self, now: DateTime<Utc>) -> Self {
        let mut resumed = *self;
        if resumed.is_running() {
            resumed.running_since = Some(now);
        }
        resumed
    }

    pub fn reset(&mut self) {
        *self = Self::new(millis(self.time_per_player_ms));
    }

    fn charge(&mut self, side: Color, now: DateTime<Utc>) -> TimeDelta {
        let left = self.remaining_at(side, side, now).max(TimeDelta::zero());
        let ms = left.num_milliseconds();
        match side {
            Color::Light => self.light_remaining_ms = ms,
            Color::Dark => self.dark_remaining_ms = ms,
        }
        left
    }
}

fn millis(ms: i64) -> TimeDelta {
    TimeDelta::try_milliseconds(ms).unwrap_or(TimeDelta::zero())
}
