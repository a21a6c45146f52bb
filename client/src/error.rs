use shared::CodecError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("server closed the connection after {0} bytes of a record")]
    Truncated(usize),
}

impl ClientError {
    /// Process exit status: the OS error code for socket failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Io(err) => err.raw_os_error().filter(|&code| code != 0).unwrap_or(1),
            _ => 1,
        }
    }
}
