//! Unix domain socket channels.

use std::path::{Path, PathBuf};

use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};

use crate::{Connection, StreamConnection, Transport, TransportError};

/// A connection over a Unix domain socket.
pub type UnixConnection = StreamConnection<OwnedReadHalf, OwnedWriteHalf>;

impl UnixConnection {
    /// Connects to a participant channel, as the terminal client does.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(path.as_ref())
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
        Ok(Self::from_stream(stream))
    }

    fn from_stream(stream: UnixStream) -> Self {
        let (read, write) = stream.into_split();
        StreamConnection::new(read, write)
    }
}

/// Listens on one participant's socket.
pub struct UnixSocketTransport {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixSocketTransport {
    /// Binds the socket at `path`, replacing a stale socket file left by
    /// an earlier run.
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let path = path.into();
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(TransportError::BindFailed { path, source }),
        }
        let listener = match UnixListener::bind(&path) {
            Ok(listener) => listener,
            Err(source) => return Err(TransportError::BindFailed { path, source }),
        };
        tracing::info!(path = %path.display(), "participant channel listening");
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for UnixSocketTransport {
    type Connection = UnixConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let conn = UnixConnection::from_stream(stream);
        tracing::debug!(id = %conn.id(), path = %self.path.display(), "accepted client");
        Ok(conn)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TransportError::AcceptFailed(e)),
        }
    }
}
