//! Transport abstraction layer for Gridlock.
//!
//! Each participant talks to its session over its own addressed local
//! channel. [`Transport`] accepts the participant's client on that
//! channel; [`Connection`] carries newline-delimited text both ways.
//!
//! # Implementations
//!
//! - [`UnixSocketTransport`] / [`UnixConnection`]: a Unix domain socket
//!   at [`socket_path`], used by the server and the terminal client
//! - [`MemoryTransport`] / [`MemoryConnection`]: in-process pairs for
//!   tests

mod error;
mod memory;
mod stream;
mod unix;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryTransport};
pub use stream::StreamConnection;
pub use unix::{UnixConnection, UnixSocketTransport};

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Longest line read in one piece. Longer input arrives as several lines.
pub const MAX_LINE_LEN: usize = 256;

/// The channel address for participant `id` under `runtime_dir`.
pub fn socket_path(runtime_dir: &Path, id: u32) -> PathBuf {
    runtime_dir.join(format!("player_{id}.sock"))
}

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Creates a new `ChannelId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan-{}", self.0)
    }
}

/// Accepts a participant's client on one addressed channel.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Waits for and accepts the next incoming connection.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// Stops accepting and releases the channel address.
    fn shutdown(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A single connection that exchanges text lines.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends `data` to the peer and flushes it.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next line, without its terminator.
    ///
    /// Returns `Ok(None)` when the peer has closed its end.
    fn recv_line(&self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Closes the sending half so the peer sees end of input.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ChannelId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_display() {
        let id = ChannelId::new(7);
        assert_eq!(id.to_string(), "chan-7");
        assert_eq!(id, ChannelId::new(7));
        assert_ne!(id, ChannelId::new(8));
    }

    #[test]
    fn test_socket_path_per_participant() {
        let dir = Path::new("/tmp/gridlock");
        assert_eq!(
            socket_path(dir, 2),
            PathBuf::from("/tmp/gridlock/player_2.sock")
        );
        assert_ne!(socket_path(dir, 0), socket_path(dir, 1));
    }
}
