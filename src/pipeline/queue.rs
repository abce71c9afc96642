//! Bounded FIFO shared by all sessions (producers) and workers (consumers).
//!
//! Two semaphores stand in for the classic "not full" / "not empty"
//! condition variables: `free` counts empty slots, `filled` counts queued
//! jobs. The deque itself is only touched under a short mutex.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::Semaphore;

/// Errors constructing or using a [`BoundedQueue`].
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("queue capacity {0} exceeds the supported maximum")]
    TooLarge(usize),
    #[error("queue closed")]
    Closed,
}

/// Fixed-capacity blocking queue.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    free: Semaphore,
    filled: Semaphore,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(QueueError::TooLarge(capacity));
        }

        let mut items = VecDeque::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| QueueError::TooLarge(capacity))?;

        Ok(Self {
            items: Mutex::new(items),
            free: Semaphore::new(capacity),
            filled: Semaphore::new(0),
            capacity,
        })
    }

    /// Insert at the tail, waiting while the queue is full.
    pub async fn push(&self, item: T) -> Result<(), QueueError> {
        let permit = self.free.acquire().await.map_err(|_| QueueError::Closed)?;
        permit.forget();

        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.filled.add_permits(1);
        Ok(())
    }

    /// Remove from the head, waiting while the queue is empty.
    pub async fn pop(&self) -> Result<T, QueueError> {
        let permit = self.filled.acquire().await.map_err(|_| QueueError::Closed)?;
        permit.forget();

        let item = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        self.free.add_permits(1);

        // A filled permit is only issued after the matching push_back.
        item.ok_or(QueueError::Closed)
    }

    /// Wake every waiter with [`QueueError::Closed`] and refuse further work.
    ///
    /// Items still queued are dropped.
    pub fn close(&self) {
        self.free.close();
        self.filled.close();
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_closed(&self) -> bool {
        self.filled.is_closed()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
