//! Persistent connection transport
//!
//! Manages the single duplex byte-stream connection to the simulator-side
//! endpoint. The protocol has no request identifiers, so the transport
//! enforces a strict one-request-one-reply line discipline: one write, then
//! one blocking read of exactly one reply line.
//!
//! Any I/O failure moves the connection back to [`ConnectionState::Disconnected`]
//! and surfaces as a [`TransportError`] for the dispatcher's retry policy;
//! it never crashes the caller.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::{debug, warn};

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {path} timed out after {timeout_ms} ms")]
    ConnectTimeout { path: String, timeout_ms: u64 },

    #[error("not connected to the simulator endpoint")]
    NotConnected,

    #[error("connection closed by the simulator endpoint")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Seam between the dispatcher and the wire.
///
/// The production implementation is [`PipeTransport`]; tests inject scripted
/// implementations to exercise the dispatcher's retry policy without a
/// running simulator.
#[async_trait]
pub trait Transport: Send {
    /// Idempotent: a no-op when already connected, otherwise connects.
    async fn ensure_connected(&mut self) -> TransportResult<()>;

    /// Drop the current connection, if any.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Write one request line, then block for exactly one reply line.
    async fn send_and_receive(&mut self, request: &str) -> TransportResult<String>;
}

/// Transport over the simulator plugin's local socket endpoint.
pub struct PipeTransport {
    path: PathBuf,
    connect_timeout: Duration,
    state: ConnectionState,
    reader: Option<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
}

impl PipeTransport {
    pub fn new(path: impl AsRef<Path>, connect_timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            connect_timeout,
            state: ConnectionState::Disconnected,
            reader: None,
            writer: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect to the endpoint, replacing any existing connection.
    ///
    /// Fails explicitly when the endpoint is unavailable or does not accept
    /// within the configured timeout; it never hangs.
    pub async fn connect(&mut self) -> TransportResult<()> {
        self.reset();
        self.state = ConnectionState::Connecting;
        debug!(path = %self.path.display(), "connecting to simulator endpoint");

        let connect = UnixStream::connect(&self.path);
        let stream = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::Io(e));
            }
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::ConnectTimeout {
                    path: self.path.display().to_string(),
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                });
            }
        };

        let (read_half, write_half) = stream.into_split();
        self.reader = Some(BufReader::new(read_half));
        self.writer = Some(write_half);
        self.state = ConnectionState::Connected;
        debug!("connection established");
        Ok(())
    }

    fn reset(&mut self) {
        self.reader = None;
        self.writer = None;
        self.state = ConnectionState::Disconnected;
    }

    async fn write_line(&mut self, request: &str) -> TransportResult<()> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;
        writer.write_all(request.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> TransportResult<String> {
        let reader = self.reader.as_mut().ok_or(TransportError::NotConnected)?;
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => Err(TransportError::Closed),
            Ok(_) => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(line)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    async fn exchange(&mut self, request: &str) -> TransportResult<String> {
        self.write_line(request).await?;
        self.read_line().await
    }
}

#[async_trait]
impl Transport for PipeTransport {
    async fn ensure_connected(&mut self) -> TransportResult<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.connect().await
    }

    async fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(path = %self.path.display(), "dropping simulator connection");
        }
        self.reset();
    }

    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    async fn send_and_receive(&mut self, request: &str) -> TransportResult<String> {
        debug!(request = %request, "sending request");
        match self.exchange(request).await {
            Ok(reply) => {
                debug!(reply = %reply, "received reply");
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "pipe exchange failed");
                self.reset();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let transport =
            PipeTransport::new("/tmp/xplane_link/nonexistent.sock", Duration::from_millis(100));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_connect_to_missing_endpoint_fails_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock");
        let mut transport = PipeTransport::new(&path, Duration::from_millis(100));

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_without_connection() {
        let mut transport =
            PipeTransport::new("/tmp/xplane_link/nonexistent.sock", Duration::from_millis(100));
        let err = transport.send_and_receive("get:sim/a").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }
}
