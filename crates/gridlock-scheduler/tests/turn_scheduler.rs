//! Integration tests for the turn scheduler.
//!
//! Participants are simulated by tasks that wait on `turn_ready` and
//! apply scripted moves straight to the arena, the same way a session
//! does after parsing a line.

use std::time::Duration;

use gridlock_arena::{
    ArenaConfig, CellRef, MoveOutcome, ParticipantId, SharedArena, ShutdownReason,
};
use gridlock_ledger::{MemoryScoreStore, ScoreLedger};
use gridlock_scheduler::{SchedulerPhase, TurnScheduler};
use tokio::task::JoinHandle;

// =========================================================================
// Helpers
// =========================================================================

fn arena(participants: usize, min: usize) -> SharedArena {
    let config = ArenaConfig {
        participants,
        min_participants: min,
        log_capacity: 256,
    };
    SharedArena::create(config, ScoreLedger::with_defaults(participants)).unwrap()
}

/// Waits for `id`'s turn. `false` if shutdown came first.
async fn wait_turn(arena: &SharedArena, id: ParticipantId) -> bool {
    arena
        .turn_ready()
        .wait_until(arena.game(), |g| {
            if g.is_shutdown() {
                Some(false)
            } else if g.is_turn_of(id) {
                Some(true)
            } else {
                None
            }
        })
        .await
}

fn play(arena: &SharedArena, id: ParticipantId, row: i64, col: i64) -> MoveOutcome {
    let cell = CellRef::new(row, col).unwrap();
    let outcome = arena.game().with(|g| g.place(id, cell)).unwrap();
    if outcome == MoveOutcome::Win {
        arena.record_win(id);
    }
    arena.game().with(|g| g.finish_turn(id));
    arena.turn_done().signal();
    outcome
}

fn spawn_player(
    arena: &SharedArena,
    id: u32,
    moves: Vec<(i64, i64)>,
) -> JoinHandle<Vec<MoveOutcome>> {
    let arena = arena.attach();
    let id = ParticipantId(id);
    tokio::spawn(async move {
        let mut outcomes = Vec::new();
        for (row, col) in moves {
            if !wait_turn(&arena, id).await {
                break;
            }
            outcomes.push(play(&arena, id, row, col));
        }
        outcomes
    })
}

async fn step(s: &mut TurnScheduler<MemoryScoreStore>) -> SchedulerPhase {
    tokio::time::timeout(Duration::from_secs(2), s.step())
        .await
        .expect("scheduler step should not hang")
}

fn drain_log(arena: &SharedArena) -> Vec<String> {
    arena.log_queue().with(|q| q.drain())
}

// =========================================================================
// Turn order
// =========================================================================

#[tokio::test]
async fn test_turns_are_granted_round_robin() {
    let arena = arena(3, 3);
    let mut s = TurnScheduler::new(arena.attach(), MemoryScoreStore::new());

    let players = [
        spawn_player(&arena, 0, vec![(0, 0), (2, 2)]),
        spawn_player(&arena, 1, vec![(0, 1), (1, 0)]),
        spawn_player(&arena, 2, vec![(0, 2), (1, 2)]),
    ];

    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    for _ in 0..6 {
        assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    }
    assert_eq!(s.metrics().turns_granted, 6);

    let log = drain_log(&arena);
    let turns: Vec<&str> = log
        .iter()
        .filter(|l| l.ends_with(" turn"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        turns,
        vec![
            "Scheduler: Player 0 turn",
            "Scheduler: Player 1 turn",
            "Scheduler: Player 2 turn",
            "Scheduler: Player 0 turn",
            "Scheduler: Player 1 turn",
            "Scheduler: Player 2 turn",
        ]
    );
    assert_eq!(log[0], "Scheduler: new round 1 prepared");

    for p in players {
        assert_eq!(p.await.unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_departed_turn_holder_is_skipped() {
    let arena = arena(3, 2);
    let mut s = TurnScheduler::new(arena.attach(), MemoryScoreStore::new());

    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);

    // Player 0 is granted the turn and leaves instead of moving.
    let leaver = {
        let arena = arena.attach();
        tokio::spawn(async move {
            assert!(wait_turn(&arena, ParticipantId(0)).await);
            arena.depart(ParticipantId(0))
        })
    };
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    let departure = leaver.await.unwrap();
    assert!(departure.held_turn);
    assert!(!departure.quorum_lost);

    let p1 = spawn_player(&arena, 1, vec![(1, 1)]);
    let p2 = spawn_player(&arena, 2, vec![(2, 2)]);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    p1.await.unwrap();
    p2.await.unwrap();

    // Next grant wraps past the departed participant.
    let p1_again = spawn_player(&arena, 1, vec![(0, 0)]);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(p1_again.await.unwrap(), vec![MoveOutcome::Continue]);
}

// =========================================================================
// Round completion and persistence
// =========================================================================

#[tokio::test]
async fn test_win_persists_scores_before_next_round() {
    let arena = arena(3, 3);
    let store = MemoryScoreStore::new();
    let mut s = TurnScheduler::new(arena.attach(), store.clone());

    let p0 = spawn_player(&arena, 0, vec![(0, 0), (0, 1), (0, 2)]);
    let p1 = spawn_player(&arena, 1, vec![(1, 0), (2, 2)]);
    let p2 = spawn_player(&arena, 2, vec![(2, 0), (1, 1)]);

    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    for _ in 0..6 {
        assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    }
    // Player 0's third move completes the top row.
    assert_eq!(step(&mut s).await, SchedulerPhase::RoundComplete);
    assert!(store.history().is_empty());

    assert_eq!(step(&mut s).await, SchedulerPhase::RoundSetup);
    let persisted = store.last().expect("scores persisted");
    assert_eq!(persisted.score(0), Some(1));
    assert_eq!(persisted.score(1), Some(0));

    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(s.metrics().rounds_started, 2);
    arena.game().with(|g| {
        assert_eq!(g.round(), 2);
        assert_eq!(g.board().occupied(), 0);
        assert_eq!(g.moves_made(), 0);
    });

    assert_eq!(
        p0.await.unwrap(),
        vec![MoveOutcome::Continue, MoveOutcome::Continue, MoveOutcome::Win]
    );
    p1.await.unwrap();
    p2.await.unwrap();

    let log = drain_log(&arena);
    assert!(log.contains(&"Scheduler: persisting scores for completed round".to_string()));
    assert!(log.contains(&"Scheduler: new round 2 prepared".to_string()));
}

#[tokio::test]
async fn test_persist_failure_is_counted_and_play_continues() {
    let arena = arena(1, 1);
    let store = MemoryScoreStore::new();
    store.set_failing(true);
    let mut s = TurnScheduler::new(arena.attach(), store.clone());

    let solo = spawn_player(&arena, 0, vec![(0, 0), (1, 1), (2, 2)]);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(step(&mut s).await, SchedulerPhase::RoundComplete);
    assert_eq!(step(&mut s).await, SchedulerPhase::RoundSetup);

    assert_eq!(s.metrics().persist_failures, 1);
    assert!(store.history().is_empty());
    assert!(!arena.is_shutdown());
    assert_eq!(arena.score_snapshot().score(0), Some(1));
    solo.await.unwrap();
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_while_waiting_on_turn_returns_promptly() {
    let arena = arena(3, 3);
    let handle = tokio::spawn(TurnScheduler::new(arena.attach(), MemoryScoreStore::new()).run());

    // Nobody plays; the scheduler sits in TurnActive until shutdown.
    tokio::time::sleep(Duration::from_millis(20)).await;
    arena.trigger_shutdown(ShutdownReason::TerminationRequested);

    let metrics = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should stop")
        .unwrap();
    assert_eq!(metrics.turns_granted, 1);
    assert_eq!(metrics.rounds_completed, 0);
}

#[tokio::test]
async fn test_quorum_loss_between_turns_stops_scheduler() {
    let arena = arena(3, 3);
    let mut s = TurnScheduler::new(arena.attach(), MemoryScoreStore::new());
    let p0 = spawn_player(&arena, 0, vec![(0, 0)]);

    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    assert_eq!(step(&mut s).await, SchedulerPhase::TurnActive);
    p0.await.unwrap();

    arena.depart(ParticipantId(2));
    assert_eq!(step(&mut s).await, SchedulerPhase::Shutdown);
    assert!(matches!(
        arena.shutdown_reason(),
        Some(ShutdownReason::QuorumLost { active: 2, minimum: 3 })
    ));
    assert!(
        drain_log(&arena)
            .contains(&"Shutting down: fewer than minimum active players".to_string())
    );
}
