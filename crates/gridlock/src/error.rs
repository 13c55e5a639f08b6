//! Unified error type for Gridlock.

use gridlock_arena::ArenaError;
use gridlock_ledger::LedgerError;
use gridlock_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Everything that can stop the server from starting surfaces as one of
/// these; the server binary maps any of them to exit status 1.
#[derive(Debug, thiserror::Error)]
pub enum GridlockError {
    /// Arena layout rejected.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Score file could not be read or written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A participant channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Server configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A filesystem resource needed at startup could not be prepared.
    #[error("setup failed ({stage}): {source}")]
    Setup {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl GridlockError {
    pub(crate) fn setup(stage: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Setup { stage, source }
    }
}
