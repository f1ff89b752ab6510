use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity of one live client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("send to connection {0} timed out")]
    Timeout(ConnectionId),
}

/// One inbound frame, independent of the socket library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Ping/pong; the transport answers these itself
    Control,
    Close,
}

/// Ping cadence for a socket. A peer that sends nothing, not even a pong,
/// for `idle_timeout()` is treated as gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keepalive {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Keepalive {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        // Interval timers panic on a zero period.
        Self {
            interval: interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    /// Longest a live peer can stay quiet: one ping interval plus the pong grace.
    pub fn idle_timeout(&self) -> Duration {
        self.interval + self.timeout
    }
}

/// Resolves after `idle`, or never when there is no limit.
pub(crate) async fn idle_elapsed(idle: Option<Duration>) {
    match idle {
        Some(idle) => tokio::time::sleep(idle).await,
        None => std::future::pending().await,
    }
}

/// Server-side handle to a client connection.
///
/// Handles are cheap to clone; registries keep clones while the transport
/// task owns the socket and drains the matching [`Outbound`] queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
    closed: CancellationToken,
    send_timeout: Duration,
}

/// Transport side of a [`Connection`]: the frames waiting to be written.
///
/// Dropping it marks the connection closed, so sends fail fast once the
/// writer is gone.
#[derive(Debug)]
pub struct Outbound {
    rx: mpsc::Receiver<String>,
    closed: CancellationToken,
}

impl Connection {
    pub fn open(capacity: usize, send_timeout: Duration) -> (Connection, Outbound) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let closed = CancellationToken::new();
        let connection = Connection {
            id: ConnectionId::new(),
            outbound: tx,
            closed: closed.clone(),
            send_timeout,
        };
        (connection, Outbound { rx, closed })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame, waiting at most `send_timeout` for room.
    pub async fn send(&self, text: String) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed(self.id));
        }
        match self.outbound.send_timeout(text, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(SendError::Timeout(self.id)),
            Err(SendTimeoutError::Closed(_)) => Err(SendError::Closed(self.id)),
        }
    }

    /// Ask the writer to flush what is queued and close the socket.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection is closed from either side.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

impl Outbound {
    /// Next frame to write, or `None` once the connection is closed and
    /// nothing is left queued.
    pub async fn next(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            text = self.rx.recv() => text,
            _ = self.closed.cancelled() => self.rx.try_recv().ok(),
        }
    }
}

impl Drop for Outbound {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}
