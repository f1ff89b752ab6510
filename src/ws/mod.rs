pub mod connection;
pub mod fanout;
pub mod handler;
pub mod hub;
pub mod notifications;
pub mod registry;
pub mod session;

pub use connection::{Connection, ConnectionId, Frame, Keepalive, Outbound, SendError};
pub use fanout::BroadcastReport;
pub use hub::BroadcastHub;
pub use registry::GroupRegistry;
pub use session::{ChatSession, SessionEnd, SessionState};
