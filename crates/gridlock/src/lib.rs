//! # Gridlock
//!
//! Turn-based tic-tac-toe arbiter for three to five participants.
//!
//! One coordinator process owns a shared arena (board, turn state, score
//! ledger and event log queue). A turn scheduler grants turns round-robin,
//! one session per participant relays moves from that participant's
//! terminal client, a background worker drains the event log to disk, and
//! a shutdown coordinator tears it all down in order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridlock::prelude::*;
//!
//! # async fn start() -> Result<(), GridlockError> {
//! let server = GridlockServer::builder()
//!     .participants(3)
//!     .runtime_dir("/tmp/gridlock")
//!     .build()
//!     .await?;
//! let report = server.run().await?;
//! println!("stopped: {}", report.reason);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod server;
mod shutdown;

pub use client::{ClientSummary, run_client};
pub use config::ServerConfig;
pub use error::GridlockError;
pub use server::{GridlockServer, GridlockServerBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownReport, termination_signal};

pub mod prelude {
    pub use crate::{
        ClientSummary, GridlockError, GridlockServer, GridlockServerBuilder, ServerConfig,
        ShutdownCoordinator, ShutdownReport, run_client, termination_signal,
    };
    pub use gridlock_arena::{ParticipantId, SharedArena, ShutdownReason};
    pub use gridlock_ledger::{FileScoreStore, MemoryScoreStore, ScoreLedger, ScoreStore};
    pub use gridlock_session::{ExitReason, SessionExit};
    pub use gridlock_transport::{
        Connection, MemoryConnection, UnixConnection, UnixSocketTransport, socket_path,
    };
}
