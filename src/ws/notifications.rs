use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{debug, info};

use super::connection::{idle_elapsed, Connection, Frame};
use super::hub::BroadcastHub;
use crate::utils::scope_guard::ScopeGuard;

/// Keep a notification connection registered on the hub until the client
/// goes away or stays silent for `idle_timeout`. Client frames carry
/// nothing and are discarded.
pub async fn hold_notification_connection<S, E>(
    hub: Arc<BroadcastHub>,
    connection: Connection,
    mut frames: S,
    idle_timeout: Option<Duration>,
) where
    S: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let connection_id = connection.id();
    hub.connect(&connection);
    let guard = ScopeGuard::new({
        let hub = hub.clone();
        move || {
            hub.disconnect(connection_id);
        }
    });

    loop {
        let frame = tokio::select! {
            frame = frames.next() => frame,
            _ = connection.closed() => {
                debug!("Notification connection {} closed by server", connection_id);
                break;
            }
            _ = idle_elapsed(idle_timeout) => {
                info!("Notification connection {} went quiet, dropping it", connection_id);
                break;
            }
        };
        match frame {
            Some(Ok(Frame::Close)) | None => {
                info!("Notification connection {} disconnected", connection_id);
                break;
            }
            Some(Err(e)) => {
                info!("Notification connection {} dropped: {}", connection_id, e);
                break;
            }
            Some(Ok(_)) => continue,
        }
    }

    guard.fire();
    connection.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn client_frames_are_ignored_until_close() {
        let hub = Arc::new(BroadcastHub::new());
        let (conn, mut out) = Connection::open(8, Duration::from_millis(50));
        let frames = stream::iter(vec![
            Ok::<_, String>(Frame::Text("hello?".into())),
            Ok(Frame::Binary(vec![1, 2, 3])),
            Ok(Frame::Control),
            Ok(Frame::Close),
        ]);

        hold_notification_connection(hub.clone(), conn.clone(), frames, None).await;

        assert!(hub.is_empty());
        assert!(conn.is_closed());
        assert_eq!(out.next().await, None);
    }

    #[tokio::test]
    async fn registered_while_the_client_is_connected() {
        let hub = Arc::new(BroadcastHub::new());
        let (conn, mut out) = Connection::open(8, Duration::from_millis(50));
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Result<Frame, String>>();
        let frames = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|f| (f, rx)) });
        let frames = Box::pin(frames);

        let task = tokio::spawn(hold_notification_connection(
            hub.clone(),
            conn.clone(),
            frames,
            Some(Duration::from_secs(10)),
        ));
        while !hub.contains(conn.id()) {
            tokio::task::yield_now().await;
        }

        hub.broadcast("system down").await;
        assert_eq!(out.next().await.as_deref(), Some("system down"));

        tx.send(Err("connection reset".into())).unwrap();
        task.await.unwrap();
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn silent_listener_is_disconnected() {
        let hub = Arc::new(BroadcastHub::new());
        let (conn, _out) = Connection::open(8, Duration::from_millis(50));
        let frames = stream::pending::<Result<Frame, String>>();

        tokio::time::timeout(
            Duration::from_secs(2),
            hold_notification_connection(hub.clone(), conn.clone(), frames, Some(Duration::from_millis(50))),
        )
        .await
        .expect("silent listener was never dropped");

        assert!(hub.is_empty());
        assert!(conn.is_closed());
    }
}
