//! Releasing a participant's slot.

use gridlock_arena::{Departure, ParticipantId, SharedArena, ShutdownReason};

/// Takes `id` out of the rotation after its client went away.
///
/// Logs the disconnect, wakes the scheduler if `id` held the turn, and
/// triggers shutdown when this departure broke the quorum.
pub fn release_participant(arena: &SharedArena, id: ParticipantId) -> Departure {
    // Logged before the slot is freed so it precedes anything the
    // scheduler logs in reaction.
    if arena.game().with(|g| g.participants().is_active(id)) {
        arena.log(format!("{id} disconnected"));
    }
    let departure = arena.depart(id);
    if departure.was_active {
        tracing::info!(participant = %id, active = departure.active, "participant disconnected");
    }
    if departure.quorum_lost {
        let reason = ShutdownReason::QuorumLost {
            active: departure.active,
            minimum: arena.config().min_participants,
        };
        if arena.trigger_shutdown(reason) {
            arena.log("Shutting down: fewer than minimum active players");
        }
    }
    departure
}

/// Releases the participant if the session task ends without saying how.
///
/// Armed for the whole session; a session that finishes normally disarms
/// it. If the task panics or is aborted, dropping the guard takes the
/// participant out of the rotation so the scheduler never waits on it.
pub struct DepartureGuard {
    arena: SharedArena,
    participant: ParticipantId,
    armed: bool,
}

impl DepartureGuard {
    pub fn new(arena: SharedArena, participant: ParticipantId) -> Self {
        Self {
            arena,
            participant,
            armed: true,
        }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.arena.is_shutdown() {
            // Aborted during teardown; nobody is waiting on this slot.
            let departure = self.arena.depart(self.participant);
            tracing::debug!(
                participant = %self.participant,
                ?departure,
                "session dropped during shutdown"
            );
        } else {
            tracing::warn!(participant = %self.participant, "session ended abnormally");
            release_participant(&self.arena, self.participant);
        }
    }
}
