use futures_util::future::join_all;

use super::connection::{Connection, ConnectionId, SendError};

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Members in the snapshot the payload was sent to
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Send `payload` to every connection concurrently. Returns how many sends
/// succeeded and the connections that failed, with their error.
pub(crate) async fn deliver(
    members: Vec<Connection>,
    payload: &str,
) -> (usize, Vec<(Connection, SendError)>) {
    let sends = members.into_iter().map(|conn| async move {
        match conn.send(payload.to_string()).await {
            Ok(()) => Ok(()),
            Err(e) => Err((conn, e)),
        }
    });

    let mut delivered = 0;
    let mut failed = Vec::new();
    for result in join_all(sends).await {
        match result {
            Ok(()) => delivered += 1,
            Err(failure) => failed.push(failure),
        }
    }
    (delivered, failed)
}
