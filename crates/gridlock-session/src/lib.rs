//! Participant sessions for Gridlock.
//!
//! One session task runs per participant slot for the whole life of the
//! arena:
//!
//! 1. **Connect**: wait for the participant's client on its channel
//!    ([`serve_participant`])
//! 2. **Play**: wait for the turn, prompt, validate and apply one move
//!    ([`ClientSession`])
//! 3. **Leave**: on disconnect, `quit`, or shutdown, release the slot and
//!    report how the session ended ([`SessionExit`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Scheduler (above)  ← grants turns through the arena's turn_ready condition
//!     ↕
//! Session Layer (this crate)  ← one participant's control loop
//!     ↕
//! Protocol / Transport (below)  ← command parsing, line channel
//! ```

mod guard;
mod session;

pub use guard::{DepartureGuard, release_participant};
pub use session::{ClientSession, ExitReason, SessionExit, serve_participant};
