//! Everything a session sends to its client.
//!
//! Each message renders to one or more complete lines. The board block
//! looks like this:
//!
//! ```text
//! Current board:
//!  X |   | O
//! -----------
//!    | + |
//! -----------
//!    |   | X
//! ```

use std::fmt;

use gridlock_arena::{Board, ParticipantId, Symbol};

use crate::ProtocolError;

/// Renders `board` in the block format shown above, newline-terminated.
pub fn render_board(board: &Board) -> String {
    let mut out = String::from("Current board:\n");
    for (r, row) in board.rows().enumerate() {
        if r > 0 {
            out.push_str("-----------\n");
        }
        let cells: Vec<String> = row
            .iter()
            .map(|cell| format!(" {} ", cell.map_or(' ', |s| s.0)))
            .collect();
        out.push_str(&cells.join("|"));
        out.push('\n');
    }
    out
}

/// A message from a session to its participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Sent once after the client connects.
    Welcome {
        participant: ParticipantId,
        symbol: Symbol,
    },
    /// The current grid, sent before every prompt.
    Board(Board),
    /// Asks the turn holder for a move.
    Prompt {
        participant: ParticipantId,
        symbol: Symbol,
    },
    /// A refused command; the turn is kept.
    Rejected(ProtocolError),
    /// The receiving participant just won the round.
    Won { participant: ParticipantId },
    /// The receiving participant's move filled the board.
    Draw,
    /// The session is closing. Last line the client will see.
    SessionEnding { reason: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome {
                participant,
                symbol,
            } => writeln!(
                f,
                "Connected as {participant} ({symbol}). Waiting for your turn."
            ),
            Self::Board(board) => f.write_str(&render_board(board)),
            Self::Prompt {
                participant,
                symbol,
            } => writeln!(
                f,
                "Your turn {participant} ({symbol}). Enter move as: row col"
            ),
            Self::Rejected(err) => writeln!(f, "{}", err.reply()),
            Self::Won { participant } => writeln!(f, "{participant} wins this round!"),
            Self::Draw => writeln!(f, "Round ended in a draw."),
            Self::SessionEnding { reason } => writeln!(f, "Session ending: {reason}"),
        }
    }
}
