use thiserror::Error;

use crate::registry::ConnectionId;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] warp::Error),

    #[error("No address to bind for {0}")]
    Unresolved(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}

pub type ServerResult<T> = Result<T, ServerError>;
