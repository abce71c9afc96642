//! Session task bookkeeping for shutdown.
//!
//! Slots are reused round-robin. This table does not limit concurrency;
//! the admission controller does. A slot whose task is still running when
//! its turn comes round again moves that task to a displaced list so
//! shutdown still waits for it.

use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::session::SessionSummary;

#[derive(Debug)]
pub struct SessionTable {
    slots: Vec<Option<JoinHandle<SessionSummary>>>,
    next: usize,
    displaced: Vec<JoinHandle<SessionSummary>>,
}

impl SessionTable {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: (0..slots.max(1)).map(|_| None).collect(),
            next: 0,
            displaced: Vec::new(),
        }
    }

    /// Record a session task in the next slot.
    pub fn insert(&mut self, handle: JoinHandle<SessionSummary>) {
        self.displaced.retain(|h| !h.is_finished());

        let slot = &mut self.slots[self.next];
        if let Some(previous) = slot.replace(handle) {
            if !previous.is_finished() {
                self.displaced.push(previous);
            }
        }
        self.next = (self.next + 1) % self.slots.len();
    }

    /// Tasks recorded and not yet finished.
    pub fn running(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .chain(self.displaced.iter())
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait for every recorded task. After `deadline` the rest are aborted.
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn drain(self, deadline: Option<Duration>) -> usize {
        let handles: Vec<_> = self.slots.into_iter().flatten().chain(self.displaced).collect();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        let joined = join_all(handles);
        let results = match deadline {
            None => joined.await,
            Some(limit) => match tokio::time::timeout(limit, joined).await {
                Ok(results) => results,
                Err(_) => {
                    let stragglers = aborts.iter().filter(|a| !a.is_finished()).count();
                    tracing::warn!(stragglers, "Drain deadline passed, aborting sessions");
                    for abort in &aborts {
                        abort.abort();
                    }
                    return stragglers;
                }
            },
        };

        for result in results {
            if let Err(e) = result {
                tracing::error!(error = %e, "Session task failed");
            }
        }
        0
    }
}
