//! The shared arena handle.

use std::sync::Arc;

use gridlock_ledger::ScoreLedger;
use tracing::{debug, info};

use crate::{
    ArenaConfig, ArenaError, Condition, Departure, GameState, Lock, LogQueue, ParticipantId,
    ShutdownReason,
};

#[derive(Debug)]
struct ArenaInner {
    config: ArenaConfig,
    game: Lock<GameState>,
    turn_ready: Condition,
    turn_done: Condition,
    log_queue: Lock<LogQueue>,
    log_ready: Condition,
    scores: Lock<ScoreLedger>,
}

/// A handle onto one arena. Clones (or [`attach`](Self::attach)) share the
/// same state.
///
/// Waiters on `turn_ready` are the participant sessions and the host's
/// shutdown watcher; `turn_done` has a single waiter, the scheduler;
/// `log_ready` has a single waiter, the log worker.
#[derive(Debug, Clone)]
pub struct SharedArena {
    inner: Arc<ArenaInner>,
}

impl SharedArena {
    /// Lays out a fresh arena: empty board, no round running, every
    /// participant active, `scores` as the starting ledger.
    pub fn create(config: ArenaConfig, scores: ScoreLedger) -> Result<Self, ArenaError> {
        config.validate()?;
        let inner = ArenaInner {
            game: Lock::new("game", GameState::new(config.participants)),
            turn_ready: Condition::new(),
            turn_done: Condition::new(),
            log_queue: Lock::new("log_queue", LogQueue::with_capacity(config.log_capacity)),
            log_ready: Condition::new(),
            scores: Lock::new("scores", scores),
            config,
        };
        info!(
            participants = inner.config.participants,
            min_participants = inner.config.min_participants,
            "arena created"
        );
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Another handle onto the same arena.
    pub fn attach(&self) -> Self {
        self.clone()
    }

    /// Number of live handles, this one included.
    pub fn attached(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Releases the arena. Fails while any other handle is still alive.
    pub fn destroy(self) -> Result<(), ArenaError> {
        match Arc::try_unwrap(self.inner) {
            Ok(_) => {
                debug!("arena destroyed");
                Ok(())
            }
            Err(inner) => Err(ArenaError::StillAttached(Arc::strong_count(&inner) - 1)),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    pub fn game(&self) -> &Lock<GameState> {
        &self.inner.game
    }

    pub fn turn_ready(&self) -> &Condition {
        &self.inner.turn_ready
    }

    pub fn turn_done(&self) -> &Condition {
        &self.inner.turn_done
    }

    pub fn log_queue(&self) -> &Lock<LogQueue> {
        &self.inner.log_queue
    }

    pub fn log_ready(&self) -> &Condition {
        &self.inner.log_ready
    }

    pub fn scores(&self) -> &Lock<ScoreLedger> {
        &self.inner.scores
    }

    // -----------------------------------------------------------------------
    // Event log
    // -----------------------------------------------------------------------

    /// Queues one event line for the log worker. Never waits on I/O.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(event = %message, "queued");
        let evicted = self.inner.log_queue.with(|q| q.push(message));
        if let Some(evicted) = evicted {
            debug!(evicted = %evicted, "log queue full, dropped oldest entry");
        }
        self.inner.log_ready.signal();
    }

    /// Marks the queue closed and wakes the worker so it can drain and exit.
    pub fn close_log(&self) {
        self.inner.log_queue.with(LogQueue::close);
        self.inner.log_ready.broadcast();
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Sets the one-way shutdown flag and wakes every waiter.
    ///
    /// Returns `true` for the call that actually set it; later calls leave
    /// the original reason in place.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) -> bool {
        let first = self.inner.game.with(|g| g.set_shutdown(reason));
        if first {
            info!(%reason, "shutdown triggered");
        }
        self.inner.turn_ready.broadcast();
        self.inner.turn_done.broadcast();
        self.inner.log_ready.broadcast();
        first
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.game.with(|g| g.is_shutdown())
    }

    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.inner.game.with(|g| g.shutdown())
    }

    /// Suspends until the shutdown flag is set.
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        self.inner
            .turn_ready
            .wait_until(&self.inner.game, |g| g.shutdown())
            .await
    }

    // -----------------------------------------------------------------------
    // Participants and scores
    // -----------------------------------------------------------------------

    /// Removes `id` from the rotation. If it held the turn, the scheduler
    /// is woken so play moves on.
    pub fn depart(&self, id: ParticipantId) -> Departure {
        let minimum = self.inner.config.min_participants;
        let departure = self.inner.game.with(|g| g.depart(id, minimum));
        if departure.was_active {
            info!(participant = %id, active = departure.active, "participant departed");
        }
        if departure.held_turn {
            self.inner.turn_done.signal();
        }
        departure
    }

    /// Adds a win to `id`'s score. Returns the new total.
    pub fn record_win(&self, id: ParticipantId) -> Option<u64> {
        self.inner.scores.with(|s| s.increment(id.slot()))
    }

    /// A copy of the ledger taken under the score lock.
    pub fn score_snapshot(&self) -> ScoreLedger {
        self.inner.scores.with(|s| s.clone())
    }
}
