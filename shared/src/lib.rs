//! Wire protocol shared by the Nim server and client.
//!
//! Every message travels as one fixed-size record of [`RECORD_SIZE`] bytes:
//! the bincode encoding of [`Message`] (fixed-width little-endian integers,
//! `u32` variant tags) followed by zero padding. Keeping every record the same
//! size means the stream needs no length prefix and a reader only has to count
//! bytes to find message boundaries.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PORT: u16 = 6325;
pub const HEAP_COUNT: usize = 4;
pub const MAX_CHAT_TEXT: usize = 60;
/// Largest amount a single move may take from a heap.
pub const MAX_TAKE: i16 = 1500;

/// Size of every record on the wire. This is the encoded size of the largest
/// message, a chat carrying [`MAX_CHAT_TEXT`] bytes of text.
pub const RECORD_SIZE: usize = 74;

/// Client identity as carried on the wire. Assigned identities are positive.
pub type ClientId = i8;

/// Chat destination that addresses every connected client.
pub const BROADCAST: ClientId = -1;
/// Identity carried by a rejected welcome.
pub const INVALID_CLIENT: ClientId = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameVariant {
    Normal,
    Misere,
}

impl GameVariant {
    /// Zero selects the normal game, anything else misère.
    pub fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            GameVariant::Normal
        } else {
            GameVariant::Misere
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameVariant::Normal => write!(f, "Regular"),
            GameVariant::Misere => write!(f, "Misere"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Spectator,
    Waiting,
    CurrentTurn,
}

impl Role {
    pub fn is_player(self) -> bool {
        self != Role::Spectator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    NotFinished,
    Win,
    Lose,
    Watched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnResult {
    Legal,
    Illegal,
    NotYourTurn,
}

/// Chat text, at most [`MAX_CHAT_TEXT`] bytes of UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatText(String);

impl ChatText {
    pub fn new(text: impl Into<String>) -> Result<Self, CodecError> {
        Self::try_from(text.into())
    }

    /// Builds a chat text from arbitrary input, cutting it at the last char
    /// boundary that fits.
    pub fn truncated(text: &str) -> Self {
        let mut end = text.len().min(MAX_CHAT_TEXT);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        ChatText(text[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChatText {
    type Error = CodecError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        if text.len() > MAX_CHAT_TEXT {
            return Err(CodecError::ChatTooLong(text.len()));
        }
        Ok(ChatText(text))
    }
}

impl From<ChatText> for String {
    fn from(text: ChatText) -> Self {
        text.0
    }
}

impl fmt::Display for ChatText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every message exchanged between server and client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Server to a freshly connected client. `variant` is `None` when the
    /// connection was refused.
    Welcome {
        variant: Option<GameVariant>,
        capacity: i8,
        identity: ClientId,
        role: Role,
    },
    Status {
        heaps: [u16; HEAP_COUNT],
        role: Role,
        outcome: Outcome,
    },
    TurnRequest {
        heap: i8,
        amount: i16,
    },
    TurnResponse {
        result: TurnResult,
    },
    Chat {
        source: ClientId,
        destination: ClientId,
        text: ChatText,
    },
}

impl Message {
    /// Welcome sent to a connection the server has no room for.
    pub fn rejected() -> Self {
        Message::Welcome {
            variant: None,
            capacity: -1,
            identity: INVALID_CLIENT,
            role: Role::Spectator,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Message::Welcome { variant: None, .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Welcome { .. } => "welcome",
            Message::Status { .. } => "status",
            Message::TurnRequest { .. } => "turn request",
            Message::TurnResponse { .. } => "turn response",
            Message::Chat { .. } => "chat",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record truncated: {got} of {size} bytes available", size = RECORD_SIZE)]
    Truncated { got: usize },
    #[error("malformed record: {0}")]
    Malformed(bincode::Error),
    #[error("message does not fit in a record: {0}")]
    Oversized(bincode::Error),
    #[error("chat text is {0} bytes, limit is {max}", max = MAX_CHAT_TEXT)]
    ChatTooLong(usize),
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
        .with_limit(RECORD_SIZE as u64)
}

/// Encodes a message into one zero-padded record.
pub fn encode(message: &Message) -> Result<[u8; RECORD_SIZE], CodecError> {
    let mut record = [0u8; RECORD_SIZE];
    options()
        .serialize_into(&mut record[..], message)
        .map_err(CodecError::Oversized)?;
    Ok(record)
}

/// Decodes the record at the start of `bytes`. Anything past the first
/// [`RECORD_SIZE`] bytes is ignored.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    if bytes.len() < RECORD_SIZE {
        return Err(CodecError::Truncated { got: bytes.len() });
    }
    options()
        .deserialize(&bytes[..RECORD_SIZE])
        .map_err(CodecError::Malformed)
}
