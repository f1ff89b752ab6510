use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::MessageStore;
use crate::utils::time::MonotonicClock;
use crate::ws::{BroadcastHub, Connection, GroupRegistry, Keepalive, Outbound};

/// Shared state handed to every handler
pub struct AppState {
    pub registry: Arc<GroupRegistry>,
    pub hub: Arc<BroadcastHub>,
    pub store: Arc<dyn MessageStore>,
    pub clock: Arc<MonotonicClock>,
    pub outbound_buffer: usize,
    pub send_timeout: Duration,
    pub keepalive: Keepalive,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn MessageStore>) -> Self {
        Self {
            registry: Arc::new(GroupRegistry::new()),
            hub: Arc::new(BroadcastHub::new()),
            store,
            clock: Arc::new(MonotonicClock::new()),
            outbound_buffer: config.outbound_buffer,
            send_timeout: config.send_timeout(),
            keepalive: Keepalive::new(config.ping_interval(), config.ping_timeout()),
        }
    }

    /// A fresh connection handle with the configured queue and timeout
    pub fn open_connection(&self) -> (Connection, Outbound) {
        Connection::open(self.outbound_buffer, self.send_timeout)
    }
}
