//! Event log pipeline for Gridlock.
//!
//! Producers call [`SharedArena::log`](gridlock_arena::SharedArena::log),
//! which only touches the in-memory queue. A single [`LogWorker`] task
//! drains the queue in batches and writes one line per event to its sink:
//!
//! ```ignore
//! let sink = open_log_file("game.log").await?;
//! let worker = tokio::spawn(LogWorker::new(arena.attach(), sink).run());
//! // ... play ...
//! arena.close_log();
//! let outcome = worker.await?;
//! ```
//!
//! The worker exits only once the queue is closed *and* empty, so every
//! line enqueued before [`close_log`](gridlock_arena::SharedArena::close_log)
//! reaches the sink.

use std::path::Path;

use gridlock_arena::SharedArena;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

/// Opens `path` for appending, creating it if needed.
pub async fn open_log_file(path: impl AsRef<Path>) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .await
}

/// Counters collected over a worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogReport {
    /// Lines successfully written.
    pub written: u64,
    /// Non-empty batches drained.
    pub batches: u64,
    /// Line writes or flushes that failed.
    pub write_failures: u64,
    /// Entries evicted from the queue before the worker saw them.
    pub dropped: u64,
}

/// What a finished worker hands back.
#[derive(Debug)]
pub struct LogOutcome<W> {
    pub sink: W,
    pub report: LogReport,
}

/// Drains the arena's log queue into `sink`.
pub struct LogWorker<W> {
    arena: SharedArena,
    sink: W,
    report: LogReport,
}

impl<W> LogWorker<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(arena: SharedArena, sink: W) -> Self {
        Self {
            arena,
            sink,
            report: LogReport::default(),
        }
    }

    /// Runs until the queue is closed and fully drained.
    pub async fn run(mut self) -> LogOutcome<W> {
        debug!("log worker started");
        loop {
            let (batch, closed) = self
                .arena
                .log_ready()
                .wait_until(self.arena.log_queue(), |q| {
                    (!q.is_empty() || q.is_closed()).then(|| (q.drain(), q.is_closed()))
                })
                .await;

            if batch.is_empty() {
                if closed {
                    break;
                }
                continue;
            }
            self.write_batch(batch).await;
        }

        self.report.dropped = self.arena.log_queue().with(|q| q.dropped());
        debug!(
            written = self.report.written,
            dropped = self.report.dropped,
            "log worker finished"
        );
        LogOutcome {
            sink: self.sink,
            report: self.report,
        }
    }

    async fn write_batch(&mut self, batch: Vec<String>) {
        self.report.batches += 1;
        for line in batch {
            let mut bytes = line.into_bytes();
            bytes.push(b'\n');
            match self.sink.write_all(&bytes).await {
                Ok(()) => self.report.written += 1,
                Err(e) => {
                    self.report.write_failures += 1;
                    error!(error = %e, "failed to write log line");
                }
            }
        }
        if let Err(e) = self.sink.flush().await {
            self.report.write_failures += 1;
            error!(error = %e, "failed to flush log sink");
        }
    }
}
