//! Unix socket channel tests.

use std::time::Duration;

use gridlock_transport::{
    Connection, Transport, TransportError, UnixConnection, UnixSocketTransport, socket_path,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_client_and_server_exchange_lines() {
    let dir = TempDir::new().unwrap();
    let path = socket_path(dir.path(), 0);
    let mut transport = UnixSocketTransport::bind(&path).unwrap();
    assert!(path.exists());

    let client = tokio::spawn({
        let path = path.clone();
        async move {
            let conn = UnixConnection::connect(&path).await.unwrap();
            conn.send(b"1 1\n").await.unwrap();
            conn.recv_line().await.unwrap()
        }
    });

    let server = tokio::time::timeout(Duration::from_secs(2), transport.accept())
        .await
        .expect("client should connect")
        .unwrap();
    assert_eq!(server.recv_line().await.unwrap().as_deref(), Some("1 1"));
    server.send(b"Cell already occupied. Try again.\n").await.unwrap();

    let reply = client.await.unwrap();
    assert_eq!(reply.as_deref(), Some("Cell already occupied. Try again."));
}

#[tokio::test]
async fn test_client_disconnect_reads_as_eof() {
    let dir = TempDir::new().unwrap();
    let path = socket_path(dir.path(), 1);
    let mut transport = UnixSocketTransport::bind(&path).unwrap();

    let client = UnixConnection::connect(&path).await.unwrap();
    let server = transport.accept().await.unwrap();
    drop(client);

    let line = tokio::time::timeout(Duration::from_secs(2), server.recv_line())
        .await
        .expect("EOF should be reported");
    assert_eq!(line.unwrap(), None);
}

#[tokio::test]
async fn test_bind_replaces_stale_socket_and_shutdown_unlinks() {
    let dir = TempDir::new().unwrap();
    let path = socket_path(dir.path(), 2);
    std::fs::write(&path, b"stale").unwrap();

    let transport = UnixSocketTransport::bind(&path).unwrap();
    assert_eq!(transport.path(), path.as_path());
    transport.shutdown().await.unwrap();
    assert!(!path.exists());

    // Unlinking twice is fine.
    transport.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bind_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("player_0.sock");
    let err = UnixSocketTransport::bind(&path).err().unwrap();
    assert!(matches!(err, TransportError::BindFailed { .. }));
}

#[tokio::test]
async fn test_connect_without_listener_fails() {
    let dir = TempDir::new().unwrap();
    let path = socket_path(dir.path(), 3);
    assert!(UnixConnection::connect(&path).await.is_err());
}
