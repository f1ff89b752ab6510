use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionId};
use super::fanout::{self, BroadcastReport};

/// The one global broadcast list used for system notifications.
///
/// Unlike a chat group the hub stays around with zero members.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    connections: DashMap<ConnectionId, Connection>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, connection: &Connection) -> bool {
        let added = self
            .connections
            .insert(connection.id(), connection.clone())
            .is_none();
        if added {
            info!("Notification connection {} registered ({} total)", connection.id(), self.len());
        }
        added
    }

    pub fn disconnect(&self, connection_id: ConnectionId) -> bool {
        let removed = self.connections.remove(&connection_id).is_some();
        if removed {
            info!("Notification connection {} removed ({} total)", connection_id, self.len());
        }
        removed
    }

    /// Send `payload` to every registered connection. Unreachable ones are
    /// dropped from the hub and closed.
    pub async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let members: Vec<Connection> = self
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        if members.is_empty() {
            debug!("Notification broadcast with no listeners");
            return BroadcastReport::default();
        }

        let (delivered, failed) = fanout::deliver(members, payload).await;

        let mut report = BroadcastReport { delivered, failed: Vec::with_capacity(failed.len()) };
        for (conn, err) in failed {
            warn!("Dropping notification listener: {}", err);
            self.disconnect(conn.id());
            conn.close();
            report.failed.push(conn.id());
        }
        info!(
            "Notification broadcast: {} delivered, {} failed",
            report.delivered,
            report.failed.len()
        );
        report
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }
}
