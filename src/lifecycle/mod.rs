//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging → Credentials → Workers → Bind channel
//!
//! Shutdown (shutdown.rs):
//!     console `exit` or signal → Stop accepting → Close admission
//!     → Drain sessions → Stop workers → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Console (console.rs):
//!     stdin lines → list / params / help / exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Drain has an optional deadline after which sessions are aborted

pub mod console;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
