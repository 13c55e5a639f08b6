//! Where ledgers live between sessions.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{LedgerError, ScoreLedger};

/// Persistence backend for a [`ScoreLedger`].
///
/// `persist` is called synchronously from the scheduler at every round
/// boundary and from the shutdown path, so implementations should finish
/// promptly and must leave the previous snapshot intact on failure.
pub trait ScoreStore: Send + Sync + 'static {
    /// Loads the ledger for `slots` participants, defaulting anything
    /// missing.
    fn load(
        &self,
        slots: usize,
    ) -> impl Future<Output = Result<ScoreLedger, LedgerError>> + Send;

    /// Replaces the persisted ledger with `ledger`.
    fn persist(
        &self,
        ledger: &ScoreLedger,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

// ---------------------------------------------------------------------------
// FileScoreStore
// ---------------------------------------------------------------------------

/// Stores the ledger as a text file, replaced atomically on each flush.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for FileScoreStore {
    async fn load(&self, slots: usize) -> Result<ScoreLedger, LedgerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let ledger = ScoreLedger::parse(&String::from_utf8_lossy(&bytes), slots);
                tracing::debug!(path = %self.path.display(), slots, "score file loaded");
                Ok(ledger)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.path.display(),
                    "no score file yet, creating defaults"
                );
                let ledger = ScoreLedger::with_defaults(slots);
                self.persist(&ledger).await?;
                Ok(ledger)
            }
            Err(source) => Err(LedgerError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn persist(&self, ledger: &ScoreLedger) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        // Write next to the target, then rename over it.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, ledger.render())
            .await
            .map_err(|e| self.write_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        tracing::debug!(path = %self.path.display(), "score file written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryScoreStore
// ---------------------------------------------------------------------------

/// Keeps every persisted snapshot in memory.
///
/// Clones share the same history, so a test can hand one clone to the
/// scheduler and inspect what it persisted through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    initial: Option<ScoreLedger>,
    history: Arc<Mutex<Vec<ScoreLedger>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `load` returns `ledger` instead of defaults.
    pub fn with_initial(ledger: ScoreLedger) -> Self {
        Self {
            initial: Some(ledger),
            ..Self::default()
        }
    }

    /// Makes every later `persist` fail, simulating unavailable storage.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every snapshot persisted so far, oldest first.
    pub fn history(&self) -> Vec<ScoreLedger> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent snapshot, if any.
    pub fn last(&self) -> Option<ScoreLedger> {
        self.history().pop()
    }
}

impl ScoreStore for MemoryScoreStore {
    async fn load(&self, slots: usize) -> Result<ScoreLedger, LedgerError> {
        Ok(self
            .initial
            .clone()
            .unwrap_or_else(|| ScoreLedger::with_defaults(slots)))
    }

    async fn persist(&self, ledger: &ScoreLedger) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Write {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("storage unavailable"),
            });
        }
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ledger.clone());
        Ok(())
    }
}
