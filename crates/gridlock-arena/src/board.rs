//! The 3×3 grid and its win/draw rules.

use std::fmt;

use crate::ParticipantId;

/// Side length of the grid.
pub const BOARD_SIZE: usize = 3;

/// A participant's mark on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub char);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounds-checked cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    row: usize,
    col: usize,
}

impl CellRef {
    /// Returns `None` when either coordinate falls outside the grid.
    pub fn new(row: i64, col: i64) -> Option<Self> {
        let row = usize::try_from(row).ok().filter(|r| *r < BOARD_SIZE)?;
        let col = usize::try_from(col).ok().filter(|c| *c < BOARD_SIZE)?;
        Some(Self { row, col })
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Why a placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("cell {0} is already occupied")]
    Occupied(CellRef),
    #[error("{0} does not hold the turn")]
    NotYourTurn(ParticipantId),
}

/// What a legal placement did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The round goes on.
    Continue,
    /// The mover completed a line.
    Win,
    /// Every cell is filled and nobody completed a line.
    Draw,
}

impl MoveOutcome {
    /// `true` for [`Win`](Self::Win) and [`Draw`](Self::Draw).
    pub fn ends_round(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Option<Symbol>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellRef) -> Option<Symbol> {
        self.cells[cell.row][cell.col]
    }

    /// Rows top to bottom, for rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Symbol>; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Writes `symbol` into an empty cell.
    pub fn place(&mut self, cell: CellRef, symbol: Symbol) -> Result<(), PlaceError> {
        let slot = &mut self.cells[cell.row][cell.col];
        if slot.is_some() {
            return Err(PlaceError::Occupied(cell));
        }
        *slot = Some(symbol);
        Ok(())
    }

    /// Classifies the board right after `symbol` was placed.
    pub fn outcome_for(&self, symbol: Symbol) -> MoveOutcome {
        if self.has_line(symbol) {
            MoveOutcome::Win
        } else if self.is_full() {
            MoveOutcome::Draw
        } else {
            MoveOutcome::Continue
        }
    }

    pub fn has_line(&self, symbol: Symbol) -> bool {
        let b = &self.cells;
        let m = Some(symbol);
        let n = BOARD_SIZE;
        (0..n).any(|i| (0..n).all(|j| b[i][j] == m))
            || (0..n).any(|j| (0..n).all(|i| b[i][j] == m))
            || (0..n).all(|i| b[i][i] == m)
            || (0..n).all(|i| b[i][n - 1 - i] == m)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}
