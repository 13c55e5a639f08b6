//! Error types for the ledger layer.

use std::path::PathBuf;

/// Errors that can occur while loading or persisting a ledger.
///
/// Persistence failures are never fatal to a running game: callers report
/// them and keep the ledger in memory.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The score file exists but could not be read.
    #[error("failed to read score file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The score file could not be written or replaced.
    #[error("failed to write score file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
