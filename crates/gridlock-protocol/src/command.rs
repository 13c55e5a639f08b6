//! Parsing of client command lines.

use gridlock_arena::CellRef;

use crate::ProtocolError;

/// Something a participant asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Place the participant's symbol at this cell.
    Move(CellRef),
    /// Leave the game. Handled exactly like a dropped connection.
    Quit,
}

/// Parses one line from a client.
///
/// Accepted forms are `"<row> <col>"` (exactly two whitespace-separated
/// integers, both in `0..BOARD_SIZE`) and the keywords `quit` / `exit`
/// in any case. Surrounding whitespace, including the line terminator,
/// is ignored.
pub fn parse_command(line: &str) -> Result<ClientCommand, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        return Ok(ClientCommand::Quit);
    }

    let malformed = || ProtocolError::Malformed(trimmed.to_string());
    let mut tokens = trimmed.split_whitespace();
    let (Some(row), Some(col), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(malformed());
    };
    let row: i64 = row.parse().map_err(|_| malformed())?;
    let col: i64 = col.parse().map_err(|_| malformed())?;

    CellRef::new(row, col)
        .map(ClientCommand::Move)
        .ok_or(ProtocolError::OutOfRange { row, col })
}
