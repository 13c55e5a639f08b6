//! The per-participant control loop.

use gridlock_arena::{
    CellRef, MoveOutcome, ParticipantId, SharedArena, ShutdownReason, Symbol, TurnGrant,
};
use gridlock_protocol::{ClientCommand, ProtocolError, ServerMessage, parse_command};
use gridlock_transport::{Connection, Transport};
use tracing::{debug, info, warn};

use crate::{DepartureGuard, release_participant};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The arena shut down while the participant was still playing.
    Shutdown,
    /// The client disconnected or sent `quit`.
    Abandoned,
    /// The channel failed to accept, read, or write.
    TransportFailed,
}

/// Returned by every session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    pub participant: ParticipantId,
    pub reason: ExitReason,
    /// Legal moves applied during the session.
    pub moves: u32,
}

enum Wake {
    Shutdown(ShutdownReason),
    Turn(TurnGrant),
}

enum Input {
    Shutdown(ShutdownReason),
    Line(String),
    Closed,
    Failed,
}

/// Accepts the participant's client on `transport`, then plays until the
/// client leaves or the arena shuts down.
pub async fn serve_participant<T: Transport>(
    arena: SharedArena,
    participant: ParticipantId,
    mut transport: T,
) -> SessionExit {
    let guard = DepartureGuard::new(arena.attach(), participant);

    let accepted = tokio::select! {
        accepted = transport.accept() => Some(accepted),
        _ = arena.wait_for_shutdown() => None,
    };

    let exit = match accepted {
        None => SessionExit {
            participant,
            reason: ExitReason::Shutdown,
            moves: 0,
        },
        Some(Err(e)) => {
            warn!(%participant, error = %e, "failed to accept client");
            release_participant(&arena, participant);
            SessionExit {
                participant,
                reason: ExitReason::TransportFailed,
                moves: 0,
            }
        }
        Some(Ok(conn)) => {
            info!(%participant, channel = %conn.id(), "client connected");
            ClientSession::new(arena.attach(), participant, conn)
                .run()
                .await
        }
    };

    if let Err(e) = transport.shutdown().await {
        debug!(%participant, error = %e, "failed to release channel");
    }
    guard.disarm();
    exit
}

/// One participant's connected session.
pub struct ClientSession<C> {
    arena: SharedArena,
    participant: ParticipantId,
    conn: C,
    moves: u32,
}

impl<C: Connection> ClientSession<C> {
    pub fn new(arena: SharedArena, participant: ParticipantId, conn: C) -> Self {
        Self {
            arena,
            participant,
            conn,
            moves: 0,
        }
    }

    /// Greets the client, then serves turns until it leaves or shutdown.
    pub async fn run(mut self) -> SessionExit {
        let symbol = self
            .arena
            .game()
            .with(|g| g.participants().symbol(self.participant));
        let Some(symbol) = symbol else {
            warn!(participant = %self.participant, "no such participant slot");
            return self.exit(ExitReason::TransportFailed);
        };

        let welcome = ServerMessage::Welcome {
            participant: self.participant,
            symbol,
        };
        if self.send(&welcome).await.is_err() {
            return self.abandon(ExitReason::TransportFailed).await;
        }

        loop {
            let grant = match self.wait_for_turn().await {
                Wake::Shutdown(reason) => return self.end(reason).await,
                Wake::Turn(grant) => grant,
            };

            let board = ServerMessage::Board(grant.board);
            let prompt = ServerMessage::Prompt {
                participant: self.participant,
                symbol: grant.symbol,
            };
            if self.send(&board).await.is_err() || self.send(&prompt).await.is_err() {
                return self.abandon(ExitReason::TransportFailed).await;
            }

            let line = match self.read_input().await {
                Input::Shutdown(reason) => return self.end(reason).await,
                Input::Closed => return self.abandon(ExitReason::Abandoned).await,
                Input::Failed => return self.abandon(ExitReason::TransportFailed).await,
                Input::Line(line) => line,
            };

            let cell = match parse_command(&line) {
                Ok(ClientCommand::Move(cell)) => cell,
                Ok(ClientCommand::Quit) => {
                    debug!(participant = %self.participant, "client quit");
                    return self.abandon(ExitReason::Abandoned).await;
                }
                Err(e) => {
                    debug!(participant = %self.participant, error = %e, "rejected input");
                    if self.send(&ServerMessage::Rejected(e)).await.is_err() {
                        return self.abandon(ExitReason::TransportFailed).await;
                    }
                    continue;
                }
            };

            let reply = self.apply_move(grant.symbol, cell);
            if let Some(reply) = reply {
                if self.send(&reply).await.is_err() {
                    return self.abandon(ExitReason::TransportFailed).await;
                }
            }
        }
    }

    /// Suspends until this participant holds the turn or shutdown.
    async fn wait_for_turn(&self) -> Wake {
        let me = self.participant;
        self.arena
            .turn_ready()
            .wait_until(self.arena.game(), |g| match g.shutdown() {
                Some(reason) => Some(Wake::Shutdown(reason)),
                None => g.grant_for(me).map(Wake::Turn),
            })
            .await
    }

    async fn read_input(&self) -> Input {
        tokio::select! {
            line = self.conn.recv_line() => match line {
                Ok(Some(line)) => Input::Line(line),
                Ok(None) => Input::Closed,
                Err(e) => {
                    debug!(participant = %self.participant, error = %e, "read failed");
                    Input::Failed
                }
            },
            reason = self.arena.wait_for_shutdown() => Input::Shutdown(reason),
        }
    }

    /// Applies a parsed move and finishes the turn if it was legal.
    /// Returns the message owed to the client.
    fn apply_move(&mut self, symbol: Symbol, cell: CellRef) -> Option<ServerMessage> {
        let me = self.participant;
        let outcome = match self.arena.game().with(|g| g.place(me, cell)) {
            Ok(outcome) => outcome,
            Err(e) => return Some(ServerMessage::Rejected(ProtocolError::from(e))),
        };
        self.moves += 1;
        self.arena.log(format!("{me} placed {symbol} at {cell}"));

        let reply = match outcome {
            MoveOutcome::Continue => None,
            MoveOutcome::Win => {
                let total = self.arena.record_win(me);
                info!(participant = %me, ?total, "round won");
                self.arena.log(format!("{me} wins this round!"));
                Some(ServerMessage::Won { participant: me })
            }
            MoveOutcome::Draw => {
                info!(participant = %me, "round drawn");
                self.arena.log("Round ended in a draw.");
                Some(ServerMessage::Draw)
            }
        };

        if self.arena.game().with(|g| g.finish_turn(me)) {
            self.arena.turn_done().signal();
        }
        reply
    }

    async fn send(&self, message: &ServerMessage) -> Result<(), C::Error> {
        let result = self.conn.send(message.to_string().as_bytes()).await;
        if let Err(e) = &result {
            debug!(participant = %self.participant, error = %e, "write failed");
        }
        result
    }

    async fn end(self, reason: ShutdownReason) -> SessionExit {
        let notice = ServerMessage::SessionEnding {
            reason: reason.to_string(),
        };
        // The client may already be gone.
        let _ = self.send(&notice).await;
        let _ = self.conn.close().await;
        debug!(participant = %self.participant, %reason, "session ending");
        self.exit(ExitReason::Shutdown)
    }

    async fn abandon(self, reason: ExitReason) -> SessionExit {
        release_participant(&self.arena, self.participant);
        let _ = self.conn.close().await;
        self.exit(reason)
    }

    fn exit(&self, reason: ExitReason) -> SessionExit {
        SessionExit {
            participant: self.participant,
            reason,
            moves: self.moves,
        }
    }
}
