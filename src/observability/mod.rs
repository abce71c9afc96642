//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events → log file, console target → screen)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log file (always)
//!     → Operator screen (startup and fatal events only)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::CONSOLE_TARGET;
