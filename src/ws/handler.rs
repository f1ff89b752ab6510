use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::connection::{Frame, Keepalive, Outbound};
use super::notifications::hold_notification_connection;
use super::session::ChatSession;
use crate::AppState;

/// Chat WebSocket, one group per connection
pub async fn chat_handler(
    Path(group_id): Path<String>,
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New chat connection attempt for group '{}'", group_id);
    ws.on_upgrade(move |socket| handle_chat_socket(socket, group_id, app_state))
}

/// Notification WebSocket, fed by `POST /send-notification`
pub async fn notifications_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New notification connection attempt");
    ws.on_upgrade(move |socket| handle_notification_socket(socket, app_state))
}

async fn handle_chat_socket(socket: WebSocket, group_id: String, app_state: Arc<AppState>) {
    let (sink, receiver) = socket.split();
    let (connection, outbound) = app_state.open_connection();
    let keepalive = app_state.keepalive;
    info!("Chat connection {} established for group '{}'", connection.id(), group_id);

    let writer = tokio::spawn(write_outbound(sink, outbound, keepalive));

    let mut session = ChatSession::new(
        group_id,
        connection,
        app_state.registry.clone(),
        app_state.store.clone(),
        app_state.clock.clone(),
    )
    .with_idle_timeout(keepalive.idle_timeout());
    session.run(receiver.map(to_frame)).await;

    join_writer(writer, keepalive.timeout).await;
    info!("Chat connection terminated");
}

async fn handle_notification_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (sink, receiver) = socket.split();
    let (connection, outbound) = app_state.open_connection();
    let keepalive = app_state.keepalive;
    info!("Notification connection {} established", connection.id());

    let writer = tokio::spawn(write_outbound(sink, outbound, keepalive));
    hold_notification_connection(
        app_state.hub.clone(),
        connection,
        receiver.map(to_frame),
        Some(keepalive.idle_timeout()),
    )
    .await;

    join_writer(writer, keepalive.timeout).await;
    info!("Notification connection terminated");
}

fn to_frame(msg: Result<Message, axum::Error>) -> Result<Frame, axum::Error> {
    msg.map(|msg| match msg {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(_) | Message::Pong(_) => Frame::Control,
        Message::Close(_) => Frame::Close,
    })
}

/// Drain the connection's queue into the socket, pinging the peer while
/// it is idle, then close it. Every socket write is bounded by
/// `keepalive.timeout`; a write that overruns stops the writer.
async fn write_outbound<S>(mut sink: S, mut outbound: Outbound, keepalive: Keepalive)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ping = time::interval_at(Instant::now() + keepalive.interval, keepalive.interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let message = tokio::select! {
            text = outbound.next() => match text {
                Some(text) => Message::Text(text),
                None => break,
            },
            _ = ping.tick() => Message::Ping(Vec::new()),
        };
        match time::timeout(keepalive.timeout, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Socket write failed, stopping writer: {}", e);
                break;
            }
            Err(_) => {
                warn!("Socket write stalled for {:?}, stopping writer", keepalive.timeout);
                break;
            }
        }
    }
    // Marks the connection closed before the socket goes away.
    drop(outbound);
    if time::timeout(keepalive.timeout, sink.close()).await.is_err() {
        debug!("Socket close timed out");
    }
}

/// Wait for the writer to finish, aborting it after `grace`. Returns
/// whether it finished cleanly.
async fn join_writer(mut writer: JoinHandle<()>, grace: Duration) -> bool {
    match time::timeout(grace, &mut writer).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Writer task failed: {}", e);
            false
        }
        Err(_) => {
            warn!("Writer task still running after {:?}, aborting it", grace);
            writer.abort();
            false
        }
    }
}
