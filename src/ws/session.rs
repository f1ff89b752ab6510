use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use super::connection::{idle_elapsed, Connection, Frame};
use super::fanout::BroadcastReport;
use super::registry::GroupRegistry;
use crate::db::MessageStore;
use crate::error::{ProtocolError, SessionError};
use crate::models::{ChatMessage, ErrorFrame, ErrorKind, InboundChatMessage};
use crate::utils::scope_guard::ScopeGuard;
use crate::utils::time::MonotonicClock;

/// Sent to the client in place of the store's own error text.
const STORE_UNAVAILABLE_DETAIL: &str = "message could not be stored and was not delivered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Joined,
    Closing,
    Closed,
}

/// How a session's receive loop ended
#[derive(Debug)]
pub enum SessionEnd {
    /// The client sent a close frame
    ClientClosed,
    /// The stream ended, failed or went quiet past the idle timeout
    Disconnected,
    /// The server closed the connection, e.g. after evicting it
    ConnectionClosed,
    ProtocolViolation(ProtocolError),
}

/// One chat connection bound to one group.
pub struct ChatSession {
    group_id: String,
    connection: Connection,
    registry: Arc<GroupRegistry>,
    store: Arc<dyn MessageStore>,
    clock: Arc<MonotonicClock>,
    idle_timeout: Option<Duration>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(
        group_id: impl Into<String>,
        connection: Connection,
        registry: Arc<GroupRegistry>,
        store: Arc<dyn MessageStore>,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            connection,
            registry,
            store,
            clock,
            idle_timeout: None,
            state: SessionState::Connecting,
        }
    }

    /// End the session as disconnected when no frame arrives for `idle`.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = Some(idle);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Join the group, relay frames until the client goes away, then leave.
    ///
    /// The leave runs exactly once, including when this future is dropped
    /// half way.
    pub async fn run<S, E>(&mut self, mut frames: S) -> SessionEnd
    where
        S: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
    {
        let connection_id = self.connection.id();
        self.registry.join(&self.connection, &self.group_id);
        self.state = SessionState::Joined;

        let leave = ScopeGuard::new({
            let registry = self.registry.clone();
            let group_id = self.group_id.clone();
            move || {
                registry.leave(connection_id, &group_id);
            }
        });

        let end = self.receive_loop(&mut frames).await;

        self.state = SessionState::Closing;
        match &end {
            SessionEnd::ProtocolViolation(e) => {
                warn!("Closing connection {} in group '{}': {}", connection_id, self.group_id, e)
            }
            other => {
                info!("Connection {} in group '{}' ended: {:?}", connection_id, self.group_id, other)
            }
        }
        leave.fire();
        self.connection.close();
        self.state = SessionState::Closed;
        end
    }

    async fn receive_loop<S, E>(&mut self, frames: &mut S) -> SessionEnd
    where
        S: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
    {
        loop {
            let frame = tokio::select! {
                frame = frames.next() => frame,
                _ = self.connection.closed() => return SessionEnd::ConnectionClosed,
                _ = idle_elapsed(self.idle_timeout) => {
                    info!(
                        "Connection {} in group '{}' went quiet, dropping it",
                        self.connection.id(),
                        self.group_id
                    );
                    return SessionEnd::Disconnected;
                }
            };

            let result = match frame {
                Some(Ok(Frame::Text(text))) => self.handle_text(&text).await.map(|_| ()),
                Some(Ok(Frame::Binary(_))) => Err(ProtocolError::UnexpectedBinary.into()),
                Some(Ok(Frame::Control)) => Ok(()),
                Some(Ok(Frame::Close)) => return SessionEnd::ClientClosed,
                Some(Err(e)) => {
                    debug!("Connection {} transport error: {}", self.connection.id(), e);
                    return SessionEnd::Disconnected;
                }
                None => return SessionEnd::Disconnected,
            };

            match result {
                Ok(()) => {}
                Err(SessionError::Protocol(e)) => {
                    self.send_error(ErrorKind::ProtocolError, e.to_string()).await;
                    return SessionEnd::ProtocolViolation(e);
                }
                Err(SessionError::Store(e)) => {
                    error!("Message for group '{}' not stored, withholding broadcast: {}", self.group_id, e);
                    self.send_error(ErrorKind::StoreUnavailable, STORE_UNAVAILABLE_DETAIL.into())
                        .await;
                }
                Err(e @ SessionError::Encode(_)) => {
                    error!("Message for group '{}' not broadcast: {}", self.group_id, e);
                }
            }
        }
    }

    /// Parse, stamp, persist, then fan out. Nothing is broadcast unless the
    /// store accepted the message.
    async fn handle_text(&self, text: &str) -> Result<BroadcastReport, SessionError> {
        let inbound = InboundChatMessage::parse(text).map_err(ProtocolError::from)?;
        let message = ChatMessage::stamped(&self.group_id, inbound, self.clock.now());
        debug!("Received message in group '{}' from '{}'", self.group_id, message.user);

        self.store.append(&message).await?;

        let payload = serde_json::to_string(&message).map_err(SessionError::Encode)?;
        Ok(self.registry.broadcast(&self.group_id, &payload).await)
    }

    async fn send_error(&self, kind: ErrorKind, detail: String) {
        let frame = ErrorFrame { error: kind, detail };
        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode error frame: {}", e);
                return;
            }
        };
        if let Err(e) = self.connection.send(payload).await {
            debug!("Could not deliver error frame: {}", e);
        }
    }
}
