use thiserror::Error;

use crate::db::StoreError;

/// A client frame that is not a chat message
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid chat message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    #[error("binary frames are not accepted")]
    UnexpectedBinary,
}

/// Why handling one inbound frame failed
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
}
