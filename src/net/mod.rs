//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming channel connection
//!     → listener.rs (Unix socket accept)
//!     → connection.rs (session id, state machine)
//!     → Hand off to the session handler
//!
//! Session States:
//!     Connected → Handshaken → Authenticated → KeyExchanged → Streaming → Closed
//! ```

pub mod connection;
pub mod listener;

pub use connection::{SessionId, SessionState};
pub use listener::{ChannelListener, ListenerError};
