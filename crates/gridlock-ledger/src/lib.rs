//! Persisted score ledger for Gridlock.
//!
//! The ledger maps each participant slot to a `<name> <score>` pair. It is
//! loaded once at startup, incremented in memory as rounds are won, and
//! rewritten in full whenever a round completes or the server shuts down.
//!
//! # Key types
//!
//! - [`ScoreLedger`]: the in-memory mapping and its text format
//! - [`ScoreStore`]: where a ledger is persisted ([`FileScoreStore`],
//!   [`MemoryScoreStore`])
//! - [`LedgerError`]: persistence failures

mod error;
mod ledger;
mod store;

pub use error::LedgerError;
pub use ledger::{MAX_NAME_LEN, ScoreEntry, ScoreLedger};
pub use store::{FileScoreStore, MemoryScoreStore, ScoreStore};
