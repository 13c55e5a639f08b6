//! The terminal client's relay loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gridlock_transport::{Connection, TransportError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::GridlockError;

/// How long server output is still shown after the user leaves.
const QUIT_LINGER: Duration = Duration::from_millis(200);

/// Line counts from one client run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSummary {
    pub lines_sent: u64,
    pub lines_received: u64,
}

/// Relays `input` lines to the server and server lines to `output`.
///
/// Returns once the server closes the channel, or shortly after the user
/// types `quit` or ends `input`. The session only reads while its
/// participant holds the turn, so a client leaving out of turn does not
/// wait for the server to notice; it closes its half and lingers briefly
/// for output already in flight.
pub async fn run_client<C, R, W>(
    conn: C,
    input: R,
    output: W,
) -> Result<ClientSummary, GridlockError>
where
    C: Connection<Error = TransportError>,
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let conn = Arc::new(conn);
    let received = Arc::new(AtomicU64::new(0));
    let mut printer = tokio::spawn(print_incoming(
        Arc::clone(&conn),
        output,
        Arc::clone(&received),
    ));
    let mut lines = input.lines();
    let mut lines_sent = 0;

    loop {
        tokio::select! {
            _ = &mut printer => {
                return Ok(ClientSummary {
                    lines_sent,
                    lines_received: received.load(Ordering::Relaxed),
                });
            }
            typed = lines.next_line() => {
                let typed = typed.map_err(GridlockError::setup("terminal input"))?;
                let Some(line) = typed else { break };
                conn.send(format!("{line}\n").as_bytes()).await?;
                lines_sent += 1;
                if line.trim().eq_ignore_ascii_case("quit") {
                    break;
                }
            }
        }
    }

    conn.close().await?;
    if tokio::time::timeout(QUIT_LINGER, &mut printer).await.is_err() {
        tracing::debug!("server still open after quit, leaving anyway");
        printer.abort();
    }
    Ok(ClientSummary {
        lines_sent,
        lines_received: received.load(Ordering::Relaxed),
    })
}

async fn print_incoming<C, W>(conn: Arc<C>, mut output: W, received: Arc<AtomicU64>)
where
    C: Connection<Error = TransportError>,
    W: AsyncWrite + Unpin + Send,
{
    loop {
        let line = match conn.recv_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "server channel failed");
                break;
            }
        };
        received.fetch_add(1, Ordering::Relaxed);
        let written = async {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await
        };
        if let Err(e) = written.await {
            tracing::debug!(error = %e, "terminal output failed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_transport::MemoryConnection;
    use tokio::io::{AsyncReadExt, BufReader};

    #[tokio::test]
    async fn test_relays_lines_until_server_closes() {
        let (server, client) = MemoryConnection::pair();
        let server = tokio::spawn(async move {
            server.send(b"Your turn Player 0 (X). Enter move as: row col\n").await.unwrap();
            let got = server.recv_line().await.unwrap();
            server.send(b"Session ending: termination requested\n").await.unwrap();
            server.close().await.unwrap();
            got
        });

        // Keyboard stays open, so only the server can end the run.
        let (mut keyboard, stdin) = tokio::io::duplex(64);
        keyboard.write_all(b"1 1\n").await.unwrap();
        let (output, mut screen) = tokio::io::duplex(1024);
        let summary = tokio::time::timeout(
            Duration::from_secs(2),
            run_client(client, BufReader::new(stdin), output),
        )
        .await
        .expect("client should finish")
        .unwrap();

        assert_eq!(server.await.unwrap().as_deref(), Some("1 1"));
        assert_eq!(summary.lines_sent, 1);
        assert_eq!(summary.lines_received, 2);

        let mut text = String::new();
        screen.read_to_string(&mut text).await.unwrap();
        assert!(text.ends_with("Session ending: termination requested\n"));
        drop(keyboard);
    }

    #[tokio::test]
    async fn test_quit_closes_our_side() {
        let (server, client) = MemoryConnection::pair();
        let server = tokio::spawn(async move {
            let first = server.recv_line().await.unwrap();
            let eof = server.recv_line().await.unwrap();
            server.close().await.unwrap();
            (first, eof)
        });

        let summary = tokio::time::timeout(
            Duration::from_secs(2),
            run_client(client, &b"quit\n2 2\n"[..], tokio::io::sink()),
        )
        .await
        .expect("client should finish")
        .unwrap();

        let (first, eof) = server.await.unwrap();
        assert_eq!(first.as_deref(), Some("quit"));
        assert_eq!(eof, None);
        assert_eq!(summary.lines_sent, 1);
    }

    #[tokio::test]
    async fn test_quit_returns_while_server_is_not_reading() {
        // Out of turn, the session neither reads nor closes.
        let (server, client) = MemoryConnection::pair();
        server.send(b"Connected as Player 2 (+). Waiting for your turn.\n").await.unwrap();

        let summary = tokio::time::timeout(
            Duration::from_secs(2),
            run_client(client, &b"quit\n"[..], tokio::io::sink()),
        )
        .await
        .expect("client should leave without waiting for its turn")
        .unwrap();
        assert_eq!(summary.lines_sent, 1);
        assert_eq!(summary.lines_received, 1);

        // The session sees the quit and then end of input on its next read.
        assert_eq!(server.recv_line().await.unwrap().as_deref(), Some("quit"));
        assert_eq!(server.recv_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_end_of_input_returns_while_server_is_not_reading() {
        let (server, client) = MemoryConnection::pair();

        let summary = tokio::time::timeout(
            Duration::from_secs(2),
            run_client(client, tokio::io::empty(), tokio::io::sink()),
        )
        .await
        .expect("client should leave on end of input")
        .unwrap();
        assert_eq!(summary, ClientSummary::default());
        assert_eq!(server.recv_line().await.unwrap(), None);
    }
}
