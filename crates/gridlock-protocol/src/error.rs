//! Error types for the protocol layer.
//!
//! A `ProtocolError` never ends a session. It is turned into a one-line
//! reply and the participant is prompted again without losing the turn.

use gridlock_arena::{BOARD_SIZE, CellRef, ParticipantId, PlaceError};

/// Why a line from a client was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not two integers (or a recognised keyword).
    #[error("malformed move: {0:?}")]
    Malformed(String),

    /// Two integers, but at least one lies outside the grid.
    #[error("move ({row},{col}) is outside the board")]
    OutOfRange { row: i64, col: i64 },

    /// The target cell already holds a symbol.
    #[error("cell {0} is already occupied")]
    Occupied(CellRef),

    /// The move arrived while another participant held the turn.
    #[error("{0} does not hold the turn")]
    OutOfTurn(ParticipantId),
}

impl ProtocolError {
    /// The text sent back to the participant.
    pub fn reply(&self) -> String {
        match self {
            Self::Malformed(_) | Self::OutOfRange { .. } => format!(
                "Invalid input. Format: row col within 0-{}.",
                BOARD_SIZE - 1
            ),
            Self::Occupied(_) => "Cell already occupied. Try again.".to_string(),
            Self::OutOfTurn(_) => "It is not your turn.".to_string(),
        }
    }
}

impl From<PlaceError> for ProtocolError {
    fn from(err: PlaceError) -> Self {
        match err {
            PlaceError::Occupied(cell) => Self::Occupied(cell),
            PlaceError::NotYourTurn(id) => Self::OutOfTurn(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_texts() {
        let malformed = ProtocolError::Malformed("hello".into());
        assert_eq!(malformed.reply(), "Invalid input. Format: row col within 0-2.");
        let range = ProtocolError::OutOfRange { row: 5, col: 0 };
        assert_eq!(range.reply(), malformed.reply());

        let cell = CellRef::new(1, 1).unwrap();
        let occupied = ProtocolError::from(PlaceError::Occupied(cell));
        assert_eq!(occupied, ProtocolError::Occupied(cell));
        assert_eq!(occupied.reply(), "Cell already occupied. Try again.");
    }

    #[test]
    fn test_error_display_names_the_problem() {
        let err = ProtocolError::OutOfRange { row: 3, col: -1 };
        assert_eq!(err.to_string(), "move (3,-1) is outside the board");
    }
}
