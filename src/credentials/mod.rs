//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! credential file (TOML)
//!     → store.rs (MemoryCredentialStore, loaded once at startup)
//!     → gateway.rs (CredentialGateway, one mutex around the store)
//!     → sessions: authenticate, record usage on close
//!     → console: list
//! ```

pub mod gateway;
pub mod store;

pub use gateway::CredentialGateway;
pub use store::{CredentialError, CredentialRecord, CredentialStore, MemoryCredentialStore};
