//! Runtime settings loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a working
//! configuration: dark pieces moved by the arm, no snapshots, info logging.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actuation::command_dispatcher::DispatchConfig;
use crate::coordinator::actuation_policy::ActuationPolicy;
use crate::coordinator::game_clock::GameClock;
use crate::errors::ConfigError;
use crate::game_state::chess_types::Color;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameSettings,
    pub actuation: ActuationSettings,
    pub persistence: PersistenceSettings,
    pub controllers: ControllerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Clock allowance per side; unset means untimed games.
    pub time_per_player_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuationSettings {
    /// Sides whose moves the arm performs.
    pub actuated_sides: Vec<Color>,
    pub ack_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter: f64,
    /// Motion time per primitive of the simulated arm.
    pub simulated_motion_ms: u64,
}

impl Default for ActuationSettings {
    fn default() -> Self {
        Self {
            actuated_sides: vec![Color::Dark],
            ack_timeout_ms: 30_000,
            max_retries: 2,
            retry_initial_delay_ms: 250,
            retry_max_delay_ms: 2_000,
            retry_jitter: 0.2,
            simulated_motion_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub snapshot_path: Option<PathBuf>,
    pub autosave: bool,
    pub restore_on_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub heartbeat_timeout_secs: u64,
    /// Board id the console registers for the local arm.
    pub board_id: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 30,
            board_id: "local-arm".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}

impl Settings {
    /// Read and validate `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml(&content)?;
        info!(path = %path.as_ref().display(), "configuration loaded");
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.time_per_player_secs == Some(0) {
            return Err(invalid("game.time_per_player_secs must be positive when set"));
        }
        let actuation = &self.actuation;
        if actuation.ack_timeout_ms == 0 {
            return Err(invalid("actuation.ack_timeout_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&actuation.retry_jitter) {
            return Err(invalid("actuation.retry_jitter must be between 0 and 1"));
        }
        if actuation.retry_initial_delay_ms > actuation.retry_max_delay_ms {
            return Err(invalid(
                "actuation.retry_initial_delay_ms must not exceed actuation.retry_max_delay_ms",
            ));
        }
        if self.controllers.heartbeat_timeout_secs == 0 {
            return Err(invalid("controllers.heartbeat_timeout_secs must be positive"));
        }
        if self.controllers.board_id.trim().is_empty() {
            return Err(invalid("controllers.board_id must not be empty"));
        }
        if (self.persistence.autosave || self.persistence.restore_on_start)
            && self.persistence.snapshot_path.is_none()
        {
            return Err(invalid("persistence.snapshot_path is required for autosave and restore_on_start"));
        }
        Ok(())
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            max_retries: self.actuation.max_retries,
            retry_initial_delay: Duration::from_millis(self.actuation.retry_initial_delay_ms),
            retry_max_delay: Duration::from_millis(self.actuation.retry_max_delay_ms),
            retry_jitter: self.actuation.retry_jitter,
        }
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.actuation.ack_timeout_ms)
    }

    pub fn simulated_motion(&self) -> Duration {
        Duration::from_millis(self.actuation.simulated_motion_ms)
    }

    pub fn actuation_policy(&self) -> ActuationPolicy {
        ActuationPolicy::from_sides(&self.actuation.actuated_sides)
    }

    /// A fresh clock for each game, or `None` for untimed play.
    pub fn game_clock(&self) -> Option<GameClock> {
        self.game.time_per_player_secs.map(|secs| {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            GameClock::new(TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX))
        })
    }

    pub fn heartbeat_timeout(&self) -> TimeDelta {
        let secs = i64::try_from(self.controllers.heartbeat_timeout_secs).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use chrono::TimeDelta;

    use super::Settings;
    use crate::errors::ConfigError;
    use crate::game_state::chess_types::Color;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_toml("").expect("empty config should be valid");
        assert_eq!(settings, Settings::default());
        assert!(settings.actuation_policy().requires_actuation(Color::Dark));
        assert!(!settings.actuation_policy().requires_actuation(Color::Light));
        assert_eq!(settings.dispatch_config().max_retries, 2);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            [actuation]
            actuated_sides = ["white", "black"]
            ack_timeout_ms = 5000
            max_retries = 0

            [logging]
            json = true
            "#,
        )
        .expect("config should parse");

        assert_eq!(settings.actuation_policy().sides(), vec![Color::Light, Color::Dark]);
        assert_eq!(settings.ack_timeout(), Duration::from_secs(5));
        assert_eq!(settings.actuation.retry_initial_delay_ms, 250);
        assert!(settings.logging.json);
        assert_eq!(settings.logging.filter, "info");
        assert_eq!(settings.game_clock(), None);
    }

    #[test]
    fn time_control_builds_a_clock() {
        let settings = Settings::from_toml("[game]\ntime_per_player_secs = 300\n").expect("config should parse");
        let clock = settings.game_clock().expect("timed config should give a clock");
        assert_eq!(clock.remaining(Color::Light), TimeDelta::minutes(5));
        assert!(!clock.is_running());

        let err = Settings::from_toml("[game]\ntime_per_player_secs = 0\n").expect_err("zero time should be rejected");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = Settings::from_toml("[actuation]\nretry_jitter = 1.5\n").expect_err("jitter should be rejected");
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = Settings::from_toml("[persistence]\nautosave = true\n").expect_err("autosave needs a path");
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = Settings::from_toml("[actuation\n").expect_err("broken toml should fail");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "[controllers]\nheartbeat_timeout_secs = 10\nboard_id = \"bench-arm\"")
            .expect("temp file should be written");

        let settings = Settings::load(file.path()).expect("config should load");
        assert_eq!(settings.controllers.board_id, "bench-arm");
        assert_eq!(settings.heartbeat_timeout().num_seconds(), 10);
    }
}
