//! `GridlockServer` builder and supervising loop.
//!
//! This is the entry point for running a Gridlock arbiter. It ties the
//! layers together: ledger → arena → channels → sessions + scheduler +
//! log worker, and hands everything to the shutdown coordinator at the
//! end.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gridlock_arena::{ParticipantId, SharedArena, ShutdownReason};
use gridlock_ledger::{FileScoreStore, ScoreStore};
use gridlock_log::{LogWorker, open_log_file};
use gridlock_scheduler::TurnScheduler;
use gridlock_session::{release_participant, serve_participant};
use gridlock_transport::{UnixSocketTransport, socket_path};
use tokio::fs::File;
use tokio::task::JoinSet;

use crate::shutdown::remove_channels;
use crate::{GridlockError, ServerConfig, ShutdownCoordinator, ShutdownReport, termination_signal};

/// Builder for configuring and starting a Gridlock server.
///
/// # Example
///
/// ```rust,ignore
/// let server = GridlockServer::builder()
///     .participants(4)
///     .runtime_dir("/run/gridlock")
///     .build()
///     .await?;
/// let report = server.run().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridlockServerBuilder {
    config: ServerConfig,
}

impl GridlockServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn participants(mut self, participants: usize) -> Self {
        self.config.participants = participants;
        self
    }

    pub fn min_participants(mut self, min_participants: usize) -> Self {
        self.config.min_participants = min_participants;
        self
    }

    pub fn runtime_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.runtime_dir = dir.into();
        self
    }

    pub fn scores_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scores_path = path.into();
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace_ms = grace.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Builds the server with scores kept in `scores_path`.
    pub async fn build(self) -> Result<GridlockServer<FileScoreStore>, GridlockError> {
        let store = FileScoreStore::new(&self.config.scores_path);
        self.build_with_store(store).await
    }

    /// Builds the server with a custom score backend.
    ///
    /// Validates the configuration, loads the ledger, creates the arena,
    /// binds one channel per participant and opens the event log. If any
    /// step fails, every channel created so far is removed again.
    pub async fn build_with_store<S>(self, store: S) -> Result<GridlockServer<S>, GridlockError>
    where
        S: ScoreStore + Clone,
    {
        let config = self.config;
        config.validate()?;

        let ledger = store.load(config.participants).await?;
        let arena = SharedArena::create(config.arena_config(), ledger)?;

        tokio::fs::create_dir_all(&config.runtime_dir)
            .await
            .map_err(GridlockError::setup("runtime directory"))?;

        let transports = match bind_channels(&config.runtime_dir, config.participants) {
            Ok(transports) => transports,
            Err(e) => {
                remove_channels(&config.runtime_dir, config.participants);
                return Err(e);
            }
        };

        let log_file = match open_log_file(&config.log_path).await {
            Ok(file) => file,
            Err(source) => {
                drop(transports);
                remove_channels(&config.runtime_dir, config.participants);
                return Err(GridlockError::Setup {
                    stage: "event log",
                    source,
                });
            }
        };

        tracing::info!(
            participants = config.participants,
            runtime_dir = %config.runtime_dir.display(),
            "gridlock server ready"
        );
        Ok(GridlockServer {
            config,
            arena,
            store,
            transports,
            log_file,
        })
    }
}

fn bind_channels(
    runtime_dir: &Path,
    participants: usize,
) -> Result<Vec<UnixSocketTransport>, GridlockError> {
    (0..participants as u32)
        .map(|id| UnixSocketTransport::bind(socket_path(runtime_dir, id)).map_err(Into::into))
        .collect()
}

/// A fully set up Gridlock server, channels bound and ready for clients.
///
/// Call [`run()`](Self::run) to start play.
pub struct GridlockServer<S> {
    config: ServerConfig,
    arena: SharedArena,
    store: S,
    transports: Vec<UnixSocketTransport>,
    log_file: File,
}

impl GridlockServer<FileScoreStore> {
    /// Creates a new builder.
    pub fn builder() -> GridlockServerBuilder {
        GridlockServerBuilder::new()
    }
}

impl<S> GridlockServer<S>
where
    S: ScoreStore + Clone,
{
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Another handle onto the server's arena.
    pub fn arena(&self) -> SharedArena {
        self.arena.attach()
    }

    /// The channel each participant's client connects to, by id.
    pub fn socket_paths(&self) -> Vec<PathBuf> {
        self.transports.iter().map(|t| t.path().to_path_buf()).collect()
    }

    /// Runs until SIGINT/SIGTERM or an internal shutdown trigger.
    pub async fn run(self) -> Result<ShutdownReport, GridlockError> {
        self.run_until(termination_signal()).await
    }

    /// Runs until `signal` resolves or the arena shuts itself down.
    pub async fn run_until(
        self,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<ShutdownReport, GridlockError> {
        let Self {
            config,
            arena,
            store,
            transports,
            log_file,
        } = self;

        let logger = tokio::spawn(LogWorker::new(arena.attach(), log_file).run());
        arena.log(format!("Server started with {} players", config.participants));
        let scheduler = tokio::spawn(TurnScheduler::new(arena.attach(), store.clone()).run());

        let mut sessions = JoinSet::new();
        let mut owners = HashMap::new();
        for (slot, transport) in transports.into_iter().enumerate() {
            let participant = ParticipantId(slot as u32);
            let handle = sessions.spawn(serve_participant(arena.attach(), participant, transport));
            owners.insert(handle.id(), participant);
        }
        tracing::info!(participants = config.participants, "gridlock server running");

        let mut reaped = Vec::new();
        tokio::pin!(signal);
        let reason = loop {
            tokio::select! {
                _ = &mut signal => break ShutdownReason::TerminationRequested,
                reason = arena.wait_for_shutdown() => break reason,
                joined = sessions.join_next_with_id() => match joined {
                    Some(Ok((_, exit))) => {
                        tracing::info!(
                            participant = %exit.participant,
                            reason = ?exit.reason,
                            "session finished"
                        );
                        reaped.push(exit);
                    }
                    Some(Err(e)) => {
                        // The task's drop guard normally did this already.
                        if let Some(participant) = owners.get(&e.id()) {
                            tracing::warn!(%participant, error = %e, "session task failed");
                            release_participant(&arena, *participant);
                        }
                    }
                    None => break ShutdownReason::ParticipantsExited,
                },
            }
        };

        let mut coordinator = ShutdownCoordinator::new(
            arena,
            store,
            scheduler,
            sessions,
            logger,
            config.runtime_dir.clone(),
            config.participants,
            config.shutdown_grace(),
        );
        for exit in reaped {
            coordinator.record_exit(exit);
        }
        Ok(coordinator.shutdown(reason).await)
    }
}
