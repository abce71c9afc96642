//! Fixed-size pool of encryption workers.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::pipeline::job::Job;
use crate::pipeline::queue::BoundedQueue;

/// Long-lived workers draining the shared job queue.
///
/// Any worker may serve any session; completion goes through the job's own
/// handle, so finishing one job never wakes an unrelated session.
#[derive(Debug)]
pub struct WorkerPool {
    queue: Arc<BoundedQueue<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers on the current runtime.
    pub fn spawn(queue: Arc<BoundedQueue<Job>>, size: usize) -> Self {
        let workers = (0..size)
            .map(|index| {
                let queue = Arc::clone(&queue);
                tokio::spawn(worker_loop(index, queue))
            })
            .collect();

        tracing::info!(workers = size, queue_capacity = queue.capacity(), "Worker pool started");

        Self { queue, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait for every worker to exit.
    ///
    /// Jobs still queued are dropped, which wakes their sessions with an
    /// abandoned-job error.
    pub async fn shutdown(self) {
        self.queue.close();
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

async fn worker_loop(index: usize, queue: Arc<BoundedQueue<Job>>) {
    tracing::debug!(worker = index, "Worker started");

    while let Ok(mut job) = queue.pop().await {
        let session = job.session();
        let len = job.len();

        job.process();
        metrics::record_job(len);

        if !job.complete() {
            tracing::debug!(worker = index, session_id = %session, "Session gone before job completed");
        }
    }

    tracing::debug!(worker = index, "Worker exiting, queue closed");
}
