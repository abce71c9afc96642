//! Client sessions.
//!
//! # Data Flow
//! ```text
//! accepted channel
//!     → handler.rs (handshake, auth, key exchange, chunk loop)
//!         ↳ admission.rs (try_admit at handshake, release on close)
//!         ↳ credentials gateway (authenticate, record usage)
//!         ↳ pipeline queue (one job in flight per session)
//! ```

pub mod admission;
pub mod handler;

pub use admission::{AdmissionController, AdmissionGuard};
pub use handler::{serve, SessionContext, SessionLimits, SessionOutcome, SessionSummary};
