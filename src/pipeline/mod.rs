//! Encryption pipeline.
//!
//! # Data Flow
//! ```text
//! session task
//!     → job.rs (Job + JobHandle, one per chunk)
//!     → queue.rs (bounded FIFO, capacity = max clients)
//!     → worker.rs (pop, XOR via cipher.rs, complete)
//!     → JobHandle resolves in the issuing session
//! ```
//!
//! # Design Decisions
//! - A session never has more than one job outstanding, so the queue can
//!   never fill up with more jobs than there are admitted sessions
//! - Completion is per job; workers never signal through the queue

pub mod cipher;
pub mod job;
pub mod queue;
pub mod worker;

pub use cipher::apply_keystream;
pub use job::{Job, JobAbandoned, JobHandle, JobStatus};
pub use queue::{BoundedQueue, QueueError};
pub use worker::WorkerPool;
