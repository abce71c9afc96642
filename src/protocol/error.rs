//! Protocol error types for the channel wire format.
//!
//! Every variant ends the session it occurred on and nothing else. Callers
//! branch on [`ProtocolError::is_disconnect`] to tell a peer going away
//! from a peer misbehaving.

use std::io;
use thiserror::Error;

/// Errors reading or writing protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer closed the channel.
    #[error("connection closed")]
    ConnectionClosed,

    /// A read did not complete within the configured timeout.
    #[error("read timed out after {secs} s")]
    Timeout {
        /// Timeout in seconds.
        secs: u64,
    },

    /// A message carried the wrong command tag for this stage.
    #[error("unexpected command {found}, expected {expected}")]
    UnexpectedCommand {
        /// Tag required at this stage.
        expected: u32,
        /// Tag actually received.
        found: u32,
    },

    /// A status word outside the known set.
    #[error("unknown status word {0}")]
    UnknownStatus(u32),

    /// A length field is zero or larger than allowed.
    #[error("{field} length {len} outside 1..={max}")]
    FieldLength {
        /// Which field.
        field: &'static str,
        /// Declared length.
        len: u32,
        /// Upper bound.
        max: usize,
    },

    /// A data packet is larger than the chunk limit.
    #[error("chunk of {len} bytes exceeds maximum {max}")]
    ChunkTooLarge {
        /// Declared payload length.
        len: u32,
        /// Upper bound.
        max: usize,
    },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl ProtocolError {
    /// True when the peer went away rather than sent something invalid.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed | Self::Timeout { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::ConnectionClosed
        } else {
            Self::Io(e)
        }
    }
}

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
