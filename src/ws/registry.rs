use std::collections::hash_map::{self, HashMap};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionId};
use super::fanout::{self, BroadcastReport};

type Members = HashMap<ConnectionId, Connection>;

/// Chat groups and their member connections.
///
/// Every operation on one group runs under that group's shard lock, and the
/// lock is only held for the in-memory change or snapshot. Groups in other
/// shards never wait on each other. A group entry exists exactly as long as
/// it has members.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: DashMap<String, Members>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to `group_id`, creating the group if needed.
    /// Returns `false` if it was already a member.
    pub fn join(&self, connection: &Connection, group_id: &str) -> bool {
        let mut members = self.groups.entry(group_id.to_string()).or_default();
        let added = match members.entry(connection.id()) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(connection.clone());
                true
            }
            hash_map::Entry::Occupied(_) => false,
        };
        let size = members.len();
        drop(members);

        if added {
            info!("Connection {} joined group '{}' ({} members)", connection.id(), group_id, size);
        } else {
            debug!("Connection {} already in group '{}'", connection.id(), group_id);
        }
        added
    }

    /// Remove a member. Deletes the group when it was the last one.
    /// Unknown groups and non-members are ignored.
    pub fn leave(&self, connection_id: ConnectionId, group_id: &str) -> bool {
        let Entry::Occupied(mut group) = self.groups.entry(group_id.to_string()) else {
            return false;
        };

        let removed = group.get_mut().remove(&connection_id).is_some();
        let remaining = group.get().len();
        if remaining == 0 {
            group.remove();
        } else {
            drop(group);
        }

        if removed {
            info!("Connection {} left group '{}' ({} members)", connection_id, group_id, remaining);
            if remaining == 0 {
                debug!("Group '{}' is empty and was removed", group_id);
            }
        }
        removed
    }

    /// Send `payload` to the members present right now.
    ///
    /// Members that cannot take the frame are evicted and closed; the rest
    /// still receive it.
    pub async fn broadcast(&self, group_id: &str, payload: &str) -> BroadcastReport {
        let Some(members) = self.snapshot(group_id) else {
            debug!("Broadcast to group '{}' with no members", group_id);
            return BroadcastReport::default();
        };

        let (delivered, failed) = fanout::deliver(members, payload).await;

        let mut report = BroadcastReport { delivered, failed: Vec::with_capacity(failed.len()) };
        for (conn, err) in failed {
            warn!("Dropping member of group '{}': {}", group_id, err);
            self.leave(conn.id(), group_id);
            conn.close();
            report.failed.push(conn.id());
        }
        debug!(
            "Broadcast to group '{}': {} delivered, {} failed",
            group_id,
            report.delivered,
            report.failed.len()
        );
        report
    }

    /// Current member ids, or `None` when there is no such group.
    pub fn members(&self, group_id: &str) -> Option<Vec<ConnectionId>> {
        self.groups.get(group_id).map(|m| m.keys().copied().collect())
    }

    pub fn contains_group(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Memberships across all groups
    pub fn connection_count(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }

    pub fn group_ids(&self) -> Vec<String> {
        self.groups.iter().map(|group| group.key().clone()).collect()
    }

    fn snapshot(&self, group_id: &str) -> Option<Vec<Connection>> {
        self.groups.get(group_id).map(|m| m.values().cloned().collect())
    }
}
