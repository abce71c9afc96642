//! Per-connection identity and state.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Name the stages a session moves through

use std::sync::atomic::{AtomicU64, Ordering};

/// Global atomic counter for session IDs.
/// Relaxed ordering is enough, only uniqueness is needed.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one accepted channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session state machine.
///
/// ```text
/// Connected → Handshaken → Authenticated → KeyExchanged → Streaming → Closed
/// ```
/// Any failure jumps straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Channel accepted, nothing read yet.
    Connected,
    /// Init request accepted and admission granted.
    Handshaken,
    /// Credentials verified.
    Authenticated,
    /// Key received.
    KeyExchanged,
    /// Exchanging data chunks.
    Streaming,
    /// Channel closed.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Handshaken => "handshaken",
            Self::Authenticated => "authenticated",
            Self::KeyExchanged => "key_exchanged",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn display_formats() {
        let id = SessionId(42);
        assert_eq!(id.to_string(), "session-42");
        assert_eq!(SessionState::KeyExchanged.to_string(), "key_exchanged");
    }
}
