use shared::CodecError;
use std::io;

/// Failure of a single client connection. Always handled by dropping that
/// client; never fatal to the server.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("peer closed the connection with {pending} bytes of a record pending")]
    Closed { pending: usize },
    #[error("peer stalled for {0} consecutive empty reads")]
    Stalled(u32),
    #[error("outbound queue full: {queued} bytes queued, {needed} more needed")]
    Backpressure { queued: usize, needed: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// No room for another client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("connection limit of {0} reached")]
    ConnectionLimit(usize),
    #[error("identity space of {0} exhausted")]
    IdentitySpace(usize),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("number of players should be between 2 and 9, got {0}")]
    PlayerCount(i64),
    #[error("connection limit should be between 1 and {max}, got {got}")]
    ConnectionLimit { got: usize, max: usize },
    #[error("identity space should be between 1 and {max}, got {got}")]
    IdentitySpace { got: usize, max: usize },
    #[error("invalid bind address {0}")]
    Address(String),
}

/// Errors that stop the server before or outside the event loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Process exit status for this error: the OS error code for socket
    /// failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerError::Io(err) => err.raw_os_error().filter(|&code| code != 0).unwrap_or(1),
            ServerError::Config(_) => 1,
        }
    }
}
