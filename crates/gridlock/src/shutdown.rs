//! Orderly teardown of a running server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gridlock_arena::{SharedArena, ShutdownReason};
use gridlock_ledger::{ScoreLedger, ScoreStore};
use gridlock_log::{LogOutcome, LogReport};
use gridlock_scheduler::SchedulerMetrics;
use gridlock_session::SessionExit;
use gridlock_transport::socket_path;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// What shutdown did, phase by phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    /// `None` if the scheduler task panicked or was already gone.
    pub scheduler: Option<SchedulerMetrics>,
    /// Sessions that finished on their own, in completion order.
    pub sessions: Vec<SessionExit>,
    /// Sessions still running after the grace period.
    pub aborted_sessions: usize,
    /// Final scores as persisted (or as they would have been).
    pub scores: ScoreLedger,
    pub scores_persisted: bool,
    pub log: Option<LogReport>,
}

/// Resolves on SIGINT or SIGTERM.
pub async fn termination_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, relying on SIGINT only");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for SIGINT either");
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "SIGINT listener failed");
                terminate.recv().await;
            }
        }
        _ = terminate.recv() => {}
    }
    info!("termination signal received");
}

/// Removes every participant socket under `runtime_dir`, then the
/// directory itself if nothing else is left in it.
pub(crate) fn remove_channels(runtime_dir: &Path, participants: usize) {
    for id in 0..participants as u32 {
        let path = socket_path(runtime_dir, id);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "socket removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove socket"),
        }
    }
    if let Err(e) = std::fs::remove_dir(runtime_dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %runtime_dir.display(), error = %e, "runtime directory kept");
        }
    }
}

/// Owns every task of a running server and tears them down in order.
///
/// Phases:
/// 1. set the shutdown flag and wake every waiter
/// 2. join the scheduler
/// 3. give sessions `grace` to finish, then abort the rest
/// 4. persist the score ledger
/// 5. log the final line, close the queue, join the log worker
/// 6. release the arena and remove the channel sockets
///
/// [`shutdown`](Self::shutdown) may be called more than once; later calls
/// return the first report without repeating any phase.
pub struct ShutdownCoordinator<S, W> {
    arena: Option<SharedArena>,
    store: S,
    scheduler: Option<JoinHandle<SchedulerMetrics>>,
    sessions: JoinSet<SessionExit>,
    logger: Option<JoinHandle<LogOutcome<W>>>,
    runtime_dir: PathBuf,
    participants: usize,
    grace: Duration,
    finished: Vec<SessionExit>,
    report: Option<ShutdownReport>,
}

impl<S, W> ShutdownCoordinator<S, W>
where
    S: ScoreStore,
    W: Send + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: SharedArena,
        store: S,
        scheduler: JoinHandle<SchedulerMetrics>,
        sessions: JoinSet<SessionExit>,
        logger: JoinHandle<LogOutcome<W>>,
        runtime_dir: PathBuf,
        participants: usize,
        grace: Duration,
    ) -> Self {
        Self {
            arena: Some(arena),
            store,
            scheduler: Some(scheduler),
            sessions,
            logger: Some(logger),
            runtime_dir,
            participants,
            grace,
            finished: Vec::new(),
            report: None,
        }
    }

    /// Sessions reaped by the supervisor before shutdown began are
    /// recorded here so they show up in the report.
    pub fn record_exit(&mut self, exit: SessionExit) {
        self.finished.push(exit);
    }

    pub async fn shutdown(&mut self, reason: ShutdownReason) -> ShutdownReport {
        if let Some(report) = &self.report {
            return report.clone();
        }
        let Some(arena) = self.arena.take() else {
            // Only reachable if a previous call was cancelled mid-way.
            warn!("shutdown resumed after an interrupted run");
            return self.fallback_report(reason);
        };

        // 1. flag + wake everyone
        arena.trigger_shutdown(reason);
        let reason = arena.shutdown_reason().unwrap_or(reason);
        info!(%reason, "shutting down");

        // 2. scheduler
        let scheduler = match self.scheduler.take() {
            Some(handle) => match handle.await {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    warn!(error = %e, "scheduler task failed");
                    None
                }
            },
            None => None,
        };

        // 3. sessions
        let aborted_sessions = self.reap_sessions().await;

        // 4. scores
        let scores = arena.score_snapshot();
        let scores_persisted = match self.store.persist(&scores).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to persist final scores");
                arena.log(format!("Failed to persist final scores: {e}"));
                false
            }
        };

        // 5. event log
        arena.log(format!("Server shutting down: {reason}"));
        arena.close_log();
        let log = match self.logger.take() {
            Some(handle) => match handle.await {
                Ok(outcome) => Some(outcome.report),
                Err(e) => {
                    warn!(error = %e, "log worker failed");
                    None
                }
            },
            None => None,
        };

        // 6. arena + channels
        if let Err(e) = arena.destroy() {
            warn!(error = %e, "arena still referenced at teardown");
        }
        remove_channels(&self.runtime_dir, self.participants);

        let report = ShutdownReport {
            reason,
            scheduler,
            sessions: std::mem::take(&mut self.finished),
            aborted_sessions,
            scores,
            scores_persisted,
            log,
        };
        info!(
            %reason,
            aborted = report.aborted_sessions,
            persisted = report.scores_persisted,
            "shutdown complete"
        );
        self.report = Some(report.clone());
        report
    }

    /// Waits up to the grace period for sessions, then aborts the rest.
    /// Returns how many were aborted.
    async fn reap_sessions(&mut self) -> usize {
        let sessions = &mut self.sessions;
        let finished = &mut self.finished;
        let drained = tokio::time::timeout(self.grace, async {
            while let Some(joined) = sessions.join_next().await {
                match joined {
                    Ok(exit) => finished.push(exit),
                    Err(e) => warn!(error = %e, "session task failed"),
                }
            }
        })
        .await;
        if drained.is_ok() {
            return 0;
        }

        warn!(remaining = self.sessions.len(), "sessions outlived the grace period, aborting");
        self.sessions.abort_all();
        let mut aborted = 0;
        while let Some(joined) = self.sessions.join_next().await {
            match joined {
                Ok(exit) => self.finished.push(exit),
                Err(_) => aborted += 1,
            }
        }
        aborted
    }

    fn fallback_report(&self, reason: ShutdownReason) -> ShutdownReport {
        ShutdownReport {
            reason,
            scheduler: None,
            sessions: self.finished.clone(),
            aborted_sessions: 0,
            scores: ScoreLedger::default(),
            scores_persisted: false,
            log: None,
        }
    }
}
