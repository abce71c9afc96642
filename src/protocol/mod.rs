//! Channel wire protocol.
//!
//! # Message Sequence
//! ```text
//! Client                                        Server
//!   | -- Init {cmd, user_len, pass_len, key_len} -> |
//!   | <- CONNECTION_ACCEPTED | CONNECTION_REJECTED  |
//!   | -- username bytes, password bytes ----------> |
//!   | <- AUTH_SUCCESSFUL | AUTH_REJECTED ---------- |
//!   | -- key bytes -------------------------------> |
//!   | -- {ENCRYPT_DATA, len} + payload -----------> |
//!   | <- len encrypted bytes ---------------------- |
//!   |    ... repeat until the client closes ...     |
//! ```

pub mod codec;
pub mod error;
pub mod messages;

pub use codec::Channel;
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{AuthStatus, InitRequest, InitStatus};
