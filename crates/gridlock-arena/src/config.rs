//! Arena layout configuration.

use serde::{Deserialize, Serialize};

use crate::ArenaError;

/// Symbols handed out to participants in id order.
pub const SYMBOLS: [char; 5] = ['X', 'O', '+', '#', '@'];

/// Largest participant count an arena can be laid out for.
pub const MAX_PARTICIPANTS: usize = SYMBOLS.len();

/// Shape of one arena.
///
/// `participants` fixes the registry size for the arena's whole lifetime;
/// `min_participants` is the quorum below which an active game is torn
/// down; `log_capacity` bounds the event queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub participants: usize,
    pub min_participants: usize,
    pub log_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            participants: 3,
            min_participants: 3,
            log_capacity: 256,
        }
    }
}

impl ArenaConfig {
    /// Checks that the layout can be built.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.participants == 0 || self.participants > MAX_PARTICIPANTS {
            return Err(ArenaError::InvalidConfig(format!(
                "participants must be between 1 and {MAX_PARTICIPANTS}, got {}",
                self.participants
            )));
        }
        if self.min_participants == 0 || self.min_participants > self.participants {
            return Err(ArenaError::InvalidConfig(format!(
                "min_participants must be between 1 and {}, got {}",
                self.participants, self.min_participants
            )));
        }
        if self.log_capacity == 0 {
            return Err(ArenaError::InvalidConfig(
                "log_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
