//! In-process channels for tests and embedding.

use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

use crate::{StreamConnection, Transport, TransportError};

/// One end of an in-memory pipe.
pub type MemoryConnection = StreamConnection<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

impl MemoryConnection {
    /// Two connected ends: `(server, client)`.
    pub fn pair() -> (Self, Self) {
        let (a, b) = tokio::io::duplex(4096);
        let (a_read, a_write) = tokio::io::split(a);
        let (b_read, b_write) = tokio::io::split(b);
        (
            StreamConnection::new(a_read, a_write),
            StreamConnection::new(b_read, b_write),
        )
    }
}

/// Hands out one pre-made connection, then reports shutdown.
pub struct MemoryTransport {
    pending: Option<MemoryConnection>,
}

impl MemoryTransport {
    /// A transport whose client is already connected. Returns the
    /// transport and the client end.
    pub fn connected() -> (Self, MemoryConnection) {
        let (server, client) = MemoryConnection::pair();
        (
            Self {
                pending: Some(server),
            },
            client,
        )
    }
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        self.pending.take().ok_or(TransportError::Shutdown)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Connection;

    #[tokio::test]
    async fn test_pair_exchanges_lines() {
        let (server, client) = MemoryConnection::pair();
        client.send(b"1 2\nquit\n").await.unwrap();
        assert_eq!(server.recv_line().await.unwrap().as_deref(), Some("1 2"));
        assert_eq!(server.recv_line().await.unwrap().as_deref(), Some("quit"));
        assert_ne!(server.id(), client.id());
    }

    #[tokio::test]
    async fn test_close_is_seen_as_end_of_input() {
        let (server, client) = MemoryConnection::pair();
        client.send(b"last\n").await.unwrap();
        client.close().await.unwrap();
        assert_eq!(server.recv_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(server.recv_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_long_line_is_split() {
        let (server, client) = MemoryConnection::pair();
        let mut long = vec![b'7'; crate::MAX_LINE_LEN + 10];
        long.push(b'\n');
        client.send(&long).await.unwrap();

        let first = server.recv_line().await.unwrap().unwrap();
        let rest = server.recv_line().await.unwrap().unwrap();
        assert_eq!(first.len(), crate::MAX_LINE_LEN);
        assert_eq!(rest.len(), 10);
    }

    #[tokio::test]
    async fn test_memory_transport_accepts_once() {
        let (mut transport, _client) = MemoryTransport::connected();
        assert!(transport.accept().await.is_ok());
        assert!(matches!(
            transport.accept().await,
            Err(TransportError::Shutdown)
        ));
    }
}
