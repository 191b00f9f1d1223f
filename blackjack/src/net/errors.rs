//! Network error types for the wire codec and game sessions.

use std::{io, time::Duration};

use thiserror::Error;

use crate::game::entities::DeckError;

/// A message that could not be decoded. Every variant means "malformed".
#[derive(Debug, Eq, Error, PartialEq)]
pub enum ProtocolError {
    /// Fewer bytes than the fixed message size
    #[error("message too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Magic cookie mismatch
    #[error("bad magic cookie {0:#010x}")]
    BadMagic(u32),

    /// Type discriminator does not match the expected message
    #[error("unexpected message type {actual:#x} (expected {expected:#x})")]
    UnexpectedType { expected: u8, actual: u8 },

    /// A field holds a value outside its domain
    #[error("invalid {field} field: {value}")]
    InvalidField { field: &'static str, value: u8 },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that end a game session. They never leave the session's task.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection closed by peer")]
    Closed,

    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed message: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("internal error: {0}")]
    Deck(#[from] DeckError),
}
