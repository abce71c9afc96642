//! Job records exchanged between sessions and workers.
//!
//! A session builds a [`Job`] for every chunk and keeps the matching
//! [`JobHandle`]. The job moves into the queue, a worker takes it, encrypts
//! the payload in place and hands it back through the handle. Ownership of
//! the payload therefore always sits with exactly one party.

use std::sync::Arc;
use tokio::sync::oneshot;

use crate::net::connection::SessionId;
use crate::pipeline::cipher::apply_keystream;

/// Completion state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting in the queue or being processed.
    Pending,
    /// Payload holds ciphertext and `offset` points past it.
    Done,
}

/// One chunk-encryption task.
#[derive(Debug)]
pub struct Job {
    session: SessionId,
    payload: Vec<u8>,
    key: Arc<[u8]>,
    offset: usize,
    status: JobStatus,
    completion: Option<oneshot::Sender<Job>>,
}

/// The issuing session's side of a job.
#[derive(Debug)]
pub struct JobHandle {
    rx: oneshot::Receiver<Job>,
}

/// The job was dropped without being completed.
#[derive(Debug, thiserror::Error)]
#[error("job abandoned before completion")]
pub struct JobAbandoned;

impl Job {
    /// Create a pending job and the handle that receives it back once done.
    pub fn new(session: SessionId, payload: Vec<u8>, key: Arc<[u8]>, offset: usize) -> (Self, JobHandle) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            session,
            payload,
            key,
            offset,
            status: JobStatus::Pending,
            completion: Some(tx),
        };
        (job, JobHandle { rx })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Key-stream position of the first payload byte, or of the byte after
    /// the payload once the job is done.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload out of a finished job.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Encrypt the payload and advance the offset. Idempotent once done.
    pub fn process(&mut self) {
        if self.status == JobStatus::Done {
            return;
        }
        self.offset = apply_keystream(&mut self.payload, &self.key, self.offset);
        self.status = JobStatus::Done;
    }

    /// Hand the job back to its session.
    ///
    /// Returns `false` if the session stopped waiting.
    pub fn complete(mut self) -> bool {
        match self.completion.take() {
            Some(tx) => tx.send(self).is_ok(),
            None => false,
        }
    }
}

impl JobHandle {
    /// Wait for the worker to hand the job back.
    pub async fn wait(self) -> Result<Job, JobAbandoned> {
        self.rx.await.map_err(|_| JobAbandoned)
    }
}
