//! The shared arena for Gridlock.
//!
//! One [`SharedArena`] holds everything the cooperating tasks of a game
//! session share: the board and turn state, the participant registry, the
//! event log queue, the score ledger, and the locks and conditions that
//! protect them. Every other crate rendezvouses through it.
//!
//! # Key types
//!
//! - [`SharedArena`]: create / attach / destroy, plus shutdown helpers
//! - [`Lock`] and [`Condition`]: the blocking primitives
//! - [`GameState`]: board, turn, round, and shutdown flag (game lock)
//! - [`LogQueue`]: drop-oldest ring of event lines (log lock)
//! - [`ArenaConfig`]: participant count, quorum, log capacity
//!
//! # Locks
//!
//! ```text
//! game       → GameState + ParticipantRegistry   conditions: turn_ready, turn_done
//! log_queue  → LogQueue                          condition:  log_ready
//! scores     → ScoreLedger
//! ```
//!
//! No code path holds two of these locks at the same time.

mod arena;
mod board;
mod config;
mod error;
mod log_queue;
mod participant;
mod state;
mod sync;

pub use arena::SharedArena;
pub use board::{BOARD_SIZE, Board, CellRef, MoveOutcome, PlaceError, Symbol};
pub use config::{ArenaConfig, MAX_PARTICIPANTS, SYMBOLS};
pub use error::ArenaError;
pub use log_queue::LogQueue;
pub use participant::{Participant, ParticipantId, ParticipantRegistry};
pub use state::{Departure, GameState, ShutdownReason, TurnGrant};
pub use sync::{Condition, Lock};
