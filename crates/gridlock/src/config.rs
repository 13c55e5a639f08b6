//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gridlock_arena::{ArenaConfig, MAX_PARTICIPANTS};
use serde::{Deserialize, Serialize};

use crate::GridlockError;

/// Everything the server needs to start.
///
/// Loadable from a JSON file; any field left out keeps its default.
///
/// ```json
/// { "participants": 4, "runtime_dir": "/run/gridlock" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Participant slots, fixed for the server's lifetime.
    pub participants: usize,
    /// Quorum. Also the lower bound for `participants`.
    pub min_participants: usize,
    /// Upper bound for `participants`.
    pub max_participants: usize,
    /// Where the per-participant sockets are created.
    pub runtime_dir: PathBuf,
    pub scores_path: PathBuf,
    pub log_path: PathBuf,
    /// Pending event lines kept before the oldest is dropped.
    pub log_capacity: usize,
    /// How long shutdown waits for sessions before aborting them.
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            participants: 3,
            min_participants: 3,
            max_participants: MAX_PARTICIPANTS,
            runtime_dir: PathBuf::from("/tmp/gridlock"),
            scores_path: PathBuf::from("scores.txt"),
            log_path: PathBuf::from("game.log"),
            log_capacity: 256,
            shutdown_grace_ms: 2_000,
        }
    }
}

impl ServerConfig {
    /// Reads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GridlockError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(GridlockError::setup("config file"))?;
        serde_json::from_str(&text)
            .map_err(|e| GridlockError::Config(format!("{}: {e}", path.display())))
    }

    /// Checks the participant bounds and capacities.
    pub fn validate(&self) -> Result<(), GridlockError> {
        if self.max_participants > MAX_PARTICIPANTS {
            return Err(GridlockError::Config(format!(
                "max_participants cannot exceed {MAX_PARTICIPANTS}"
            )));
        }
        if self.min_participants == 0 || self.min_participants > self.max_participants {
            return Err(GridlockError::Config(format!(
                "min_participants must be between 1 and {}",
                self.max_participants
            )));
        }
        if self.participants < self.min_participants || self.participants > self.max_participants
        {
            return Err(GridlockError::Config(format!(
                "Player count must be between {} and {}",
                self.min_participants, self.max_participants
            )));
        }
        if self.log_capacity == 0 {
            return Err(GridlockError::Config("log_capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            participants: self.participants,
            min_participants: self.min_participants,
            log_capacity: self.log_capacity,
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_participants, 5);
        assert!(config.arena_config().validate().is_ok());
    }

    #[test]
    fn test_participants_outside_bounds_rejected() {
        for participants in [2, 6] {
            let config = ServerConfig {
                participants,
                ..ServerConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid configuration: Player count must be between 3 and 5"
            );
        }
    }

    #[test]
    fn test_lower_quorum_allows_fewer_participants() {
        let config = ServerConfig {
            participants: 2,
            min_participants: 2,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gridlock.json");
        std::fs::write(&path, r#"{ "participants": 4, "log_capacity": 16 }"#).unwrap();

        let config = ServerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.participants, 4);
        assert_eq!(config.log_capacity, 16);
        assert_eq!(config.min_participants, 3);
        assert_eq!(config.scores_path, PathBuf::from("scores.txt"));
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gridlock.json");
        std::fs::write(&path, "{ participants: ").unwrap();
        assert!(matches!(
            ServerConfig::from_json_file(&path),
            Err(GridlockError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_a_setup_error() {
        let err = ServerConfig::from_json_file("/nonexistent/gridlock.json").unwrap_err();
        assert!(matches!(err, GridlockError::Setup { .. }));
    }
}
