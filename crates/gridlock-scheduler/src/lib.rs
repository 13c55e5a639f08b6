//! Turn scheduler for Gridlock.
//!
//! Hands the turn to one active participant at a time, strictly round
//! robin, and starts a fresh round whenever the previous one ended.
//!
//! # Phases
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │
//!      RoundSetup ──► TurnActive ──► RoundComplete
//!            ▲            │
//!            └────────────┘  (turn ended, round goes on)
//!
//!      any phase ──► Shutdown   (flag set, quorum lost, nobody active)
//! ```
//!
//! The scheduler never polls. It blocks on the arena's `turn_done`
//! condition while a participant holds the turn, and every wake-up
//! re-checks both "turn cleared" and "shutdown".
//!
//! # Integration
//!
//! ```ignore
//! let scheduler = TurnScheduler::new(arena.attach(), FileScoreStore::new("scores.txt"));
//! let handle = tokio::spawn(scheduler.run());
//! // ... sessions play ...
//! arena.trigger_shutdown(ShutdownReason::TerminationRequested);
//! let metrics = handle.await?;
//! ```

use gridlock_arena::{ParticipantId, SharedArena, ShutdownReason};
use gridlock_ledger::ScoreStore;
use tracing::{debug, error, info};

// ---------------------------------------------------------------------------
// Phases and metrics
// ---------------------------------------------------------------------------

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Check quorum and start a round if none is running.
    RoundSetup,
    /// Grant the next turn and wait for it to finish.
    TurnActive,
    /// The last turn ended the round; persist scores.
    RoundComplete,
    /// Terminal.
    Shutdown,
}

/// Counters collected over a scheduler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerMetrics {
    pub rounds_started: u64,
    pub turns_granted: u64,
    pub rounds_completed: u64,
    /// Score flushes that failed. Play continues regardless.
    pub persist_failures: u64,
}

enum Gate {
    Stop,
    QuorumLost { active: usize, minimum: usize },
    Open,
}

enum Grant {
    Stop,
    QuorumLost { active: usize, minimum: usize },
    Nobody,
    Granted(ParticipantId),
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives turns for one arena.
pub struct TurnScheduler<S> {
    arena: SharedArena,
    store: S,
    phase: SchedulerPhase,
    metrics: SchedulerMetrics,
}

impl<S: ScoreStore> TurnScheduler<S> {
    pub fn new(arena: SharedArena, store: S) -> Self {
        debug!(
            min_participants = arena.config().min_participants,
            "turn scheduler created"
        );
        Self {
            arena,
            store,
            phase: SchedulerPhase::RoundSetup,
            metrics: SchedulerMetrics::default(),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Performs one phase transition and returns the new phase.
    ///
    /// From `TurnActive` this suspends until the granted turn finishes or
    /// shutdown is signalled.
    pub async fn step(&mut self) -> SchedulerPhase {
        self.phase = match self.phase {
            SchedulerPhase::RoundSetup => self.setup_round(),
            SchedulerPhase::TurnActive => self.run_turn().await,
            SchedulerPhase::RoundComplete => self.complete_round().await,
            SchedulerPhase::Shutdown => SchedulerPhase::Shutdown,
        };
        self.phase
    }

    /// Steps until shutdown and returns the final metrics.
    pub async fn run(mut self) -> SchedulerMetrics {
        info!("turn scheduler running");
        while self.step().await != SchedulerPhase::Shutdown {}
        info!(
            rounds = self.metrics.rounds_completed,
            turns = self.metrics.turns_granted,
            "turn scheduler stopped"
        );
        self.metrics
    }

    fn quorum_lost(&self, active: usize, minimum: usize) -> SchedulerPhase {
        if self.arena.trigger_shutdown(ShutdownReason::QuorumLost { active, minimum }) {
            self.arena.log("Shutting down: fewer than minimum active players");
        }
        SchedulerPhase::Shutdown
    }

    fn setup_round(&mut self) -> SchedulerPhase {
        let minimum = self.arena.config().min_participants;
        let mut started = None;
        let gate = self.arena.game().with(|g| {
            if g.is_shutdown() {
                return Gate::Stop;
            }
            let active = g.participants().active_count();
            if active < minimum {
                return Gate::QuorumLost { active, minimum };
            }
            if !g.game_active() {
                g.reset_round();
                started = Some(g.round());
            }
            Gate::Open
        });

        match gate {
            Gate::Stop => SchedulerPhase::Shutdown,
            Gate::QuorumLost { active, minimum } => self.quorum_lost(active, minimum),
            Gate::Open => {
                if let Some(round) = started {
                    self.metrics.rounds_started += 1;
                    info!(round, "new round prepared");
                    self.arena.log(format!("Scheduler: new round {round} prepared"));
                }
                SchedulerPhase::TurnActive
            }
        }
    }

    async fn run_turn(&mut self) -> SchedulerPhase {
        let minimum = self.arena.config().min_participants;
        let grant = self.arena.game().with(|g| {
            if g.is_shutdown() {
                return Grant::Stop;
            }
            let active = g.participants().active_count();
            if active < minimum {
                return Grant::QuorumLost { active, minimum };
            }
            match g.grant_next_turn() {
                Some(id) => Grant::Granted(id),
                None => Grant::Nobody,
            }
        });

        let holder = match grant {
            Grant::Stop => return SchedulerPhase::Shutdown,
            Grant::QuorumLost { active, minimum } => return self.quorum_lost(active, minimum),
            Grant::Nobody => {
                self.arena.trigger_shutdown(ShutdownReason::NoActiveParticipants);
                return SchedulerPhase::Shutdown;
            }
            Grant::Granted(id) => id,
        };

        self.metrics.turns_granted += 1;
        debug!(participant = %holder, "turn granted");
        self.arena.log(format!("Scheduler: {holder} turn"));
        self.arena.turn_ready().broadcast();

        // Some(round_ended) once the turn clears, None on shutdown.
        let finished = self
            .arena
            .turn_done()
            .wait_until(self.arena.game(), |g| {
                if g.is_shutdown() {
                    Some(None)
                } else if !g.turn_in_progress() {
                    Some(Some(!g.game_active()))
                } else {
                    None
                }
            })
            .await;

        match finished {
            None => SchedulerPhase::Shutdown,
            Some(true) => SchedulerPhase::RoundComplete,
            Some(false) => SchedulerPhase::TurnActive,
        }
    }

    async fn complete_round(&mut self) -> SchedulerPhase {
        self.metrics.rounds_completed += 1;
        self.arena.log("Scheduler: persisting scores for completed round");

        let snapshot = self.arena.score_snapshot();
        match self.store.persist(&snapshot).await {
            Ok(()) => debug!("scores persisted"),
            Err(e) => {
                self.metrics.persist_failures += 1;
                error!(error = %e, "failed to persist scores, continuing");
                self.arena.log(format!("Scheduler: failed to persist scores: {e}"));
            }
        }

        if self.arena.is_shutdown() {
            SchedulerPhase::Shutdown
        } else {
            SchedulerPhase::RoundSetup
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_arena::ArenaConfig;
    use gridlock_ledger::{MemoryScoreStore, ScoreLedger};

    fn scheduler(participants: usize, min: usize) -> TurnScheduler<MemoryScoreStore> {
        let config = ArenaConfig {
            participants,
            min_participants: min,
            log_capacity: 64,
        };
        let arena =
            SharedArena::create(config, ScoreLedger::with_defaults(participants)).unwrap();
        TurnScheduler::new(arena, MemoryScoreStore::new())
    }

    #[tokio::test]
    async fn test_first_step_starts_round_one() {
        let mut s = scheduler(3, 3);
        assert_eq!(s.phase(), SchedulerPhase::RoundSetup);
        assert_eq!(s.step().await, SchedulerPhase::TurnActive);
        assert_eq!(s.metrics().rounds_started, 1);
        s.arena.game().with(|g| {
            assert!(g.game_active());
            assert_eq!(g.round(), 1);
            assert_eq!(g.turn_holder(), None);
        });
    }

    #[tokio::test]
    async fn test_setup_below_quorum_triggers_shutdown() {
        let mut s = scheduler(3, 3);
        s.arena.depart(ParticipantId(1));
        assert_eq!(s.step().await, SchedulerPhase::Shutdown);
        assert_eq!(
            s.arena.shutdown_reason(),
            Some(ShutdownReason::QuorumLost {
                active: 2,
                minimum: 3
            })
        );
    }

    #[tokio::test]
    async fn test_shutdown_phase_is_terminal() {
        let mut s = scheduler(3, 3);
        s.arena.trigger_shutdown(ShutdownReason::TerminationRequested);
        assert_eq!(s.step().await, SchedulerPhase::Shutdown);
        assert_eq!(s.step().await, SchedulerPhase::Shutdown);
        assert_eq!(s.metrics().rounds_started, 0);
    }
}
