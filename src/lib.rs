//! Local IPC encryption service.
//!
//! Clients connect over a Unix socket, authenticate, hand over a key and
//! then stream chunks that a fixed pool of workers XOR-encrypts. The key
//! stream continues across the chunks of one session.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod session;

pub use client::{ClientError, EncryptClient};
pub use config::ServerConfig;
pub use error::ServerError;
pub use lifecycle::Shutdown;
pub use server::Server;
