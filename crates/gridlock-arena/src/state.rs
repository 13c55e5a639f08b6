//! Game and turn state guarded by the arena's game lock.

use std::fmt;

use crate::{Board, CellRef, MoveOutcome, ParticipantId, ParticipantRegistry, PlaceError, Symbol};

/// Why the arena is shutting down. Set once and never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT, SIGTERM or an explicit request from the host.
    TerminationRequested,
    /// A departure left fewer active participants than the quorum.
    QuorumLost { active: usize, minimum: usize },
    /// Every session task has finished.
    ParticipantsExited,
    /// The scheduler found nobody to grant a turn to.
    NoActiveParticipants,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerminationRequested => write!(f, "termination requested"),
            Self::QuorumLost { active, minimum } => write!(
                f,
                "fewer than minimum active players ({active} of {minimum})"
            ),
            Self::ParticipantsExited => write!(f, "all participants exited"),
            Self::NoActiveParticipants => write!(f, "no active participants"),
        }
    }
}

/// What a session needs to present a granted turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnGrant {
    pub board: Board,
    pub symbol: Symbol,
    pub round: u64,
}

/// Result of [`GameState::depart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The participant was active before this call.
    pub was_active: bool,
    /// The participant held an in-progress turn, now cleared.
    pub held_turn: bool,
    /// Active participants remaining.
    pub active: usize,
    /// This departure dropped the arena below quorum for the first time.
    pub quorum_lost: bool,
}

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    moves_made: u32,
    current_turn: Option<ParticipantId>,
    turn_in_progress: bool,
    game_active: bool,
    round: u64,
    shutdown: Option<ShutdownReason>,
    participants: ParticipantRegistry,
}

impl GameState {
    /// Fresh state: empty board, no round running, every participant
    /// active.
    pub fn new(participants: usize) -> Self {
        Self {
            board: Board::empty(),
            moves_made: 0,
            current_turn: None,
            turn_in_progress: false,
            game_active: false,
            round: 0,
            shutdown: None,
            participants: ParticipantRegistry::with_active(participants),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn current_turn(&self) -> Option<ParticipantId> {
        self.current_turn
    }

    pub fn turn_in_progress(&self) -> bool {
        self.turn_in_progress
    }

    pub fn game_active(&self) -> bool {
        self.game_active
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn shutdown(&self) -> Option<ShutdownReason> {
        self.shutdown
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_some()
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    /// Starts the next round. The turn cursor survives so the opening
    /// move rotates between rounds.
    pub fn reset_round(&mut self) {
        self.board = Board::empty();
        self.moves_made = 0;
        self.turn_in_progress = false;
        self.game_active = true;
        self.round += 1;
    }

    /// Hands the turn to the next active participant in ring order and
    /// marks it in progress. `None` when nobody is active.
    pub fn grant_next_turn(&mut self) -> Option<ParticipantId> {
        let next = self.participants.next_active_after(self.current_turn)?;
        self.current_turn = Some(next);
        self.turn_in_progress = true;
        Some(next)
    }

    /// The participant whose turn is in progress, if any.
    pub fn turn_holder(&self) -> Option<ParticipantId> {
        self.current_turn.filter(|_| self.turn_in_progress)
    }

    pub fn is_turn_of(&self, id: ParticipantId) -> bool {
        self.turn_holder() == Some(id)
    }

    /// Board, symbol and round for `id`, when `id` holds the turn.
    pub fn grant_for(&self, id: ParticipantId) -> Option<TurnGrant> {
        if !self.is_turn_of(id) {
            return None;
        }
        let symbol = self.participants.symbol(id)?;
        Some(TurnGrant {
            board: self.board,
            symbol,
            round: self.round,
        })
    }

    /// Places `id`'s symbol. Only the turn holder may move.
    ///
    /// A move that wins or fills the board ends the round.
    pub fn place(&mut self, id: ParticipantId, cell: CellRef) -> Result<MoveOutcome, PlaceError> {
        let symbol = match self.participants.symbol(id) {
            Some(symbol) if self.is_turn_of(id) => symbol,
            _ => return Err(PlaceError::NotYourTurn(id)),
        };
        self.board.place(cell, symbol)?;
        self.moves_made += 1;
        let outcome = self.board.outcome_for(symbol);
        if outcome.ends_round() {
            self.game_active = false;
        }
        Ok(outcome)
    }

    /// Clears the in-progress flag if `id` holds the turn.
    pub fn finish_turn(&mut self, id: ParticipantId) -> bool {
        if self.is_turn_of(id) {
            self.turn_in_progress = false;
            true
        } else {
            false
        }
    }

    /// Deactivates `id`, releasing its turn, and checks the quorum.
    pub fn depart(&mut self, id: ParticipantId, min_participants: usize) -> Departure {
        let was_active = self.participants.deactivate(id);
        let held_turn = self.finish_turn(id);
        let active = self.participants.active_count();
        Departure {
            was_active,
            held_turn,
            active,
            quorum_lost: was_active && active < min_participants && self.shutdown.is_none(),
        }
    }

    /// Sets the shutdown flag. Only the first call has any effect.
    pub fn set_shutdown(&mut self, reason: ShutdownReason) -> bool {
        if self.shutdown.is_some() {
            return false;
        }
        self.shutdown = Some(reason);
        true
    }
}
