//! Admission control for concurrent sessions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;

#[derive(Debug)]
struct Counts {
    live: usize,
    ceiling: usize,
}

/// Tracks live sessions against a ceiling.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    counts: Arc<Mutex<Counts>>,
}

impl AdmissionController {
    pub fn new(ceiling: usize) -> Self {
        Self {
            counts: Arc::new(Mutex::new(Counts { live: 0, ceiling })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counts> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one session if below the ceiling.
    ///
    /// The returned guard releases the slot when dropped.
    pub fn try_admit(&self) -> Option<AdmissionGuard> {
        let mut counts = self.lock();
        if counts.live >= counts.ceiling {
            tracing::info!(live = counts.live, ceiling = counts.ceiling, "Connection not accepted, too many clients");
            return None;
        }
        counts.live += 1;
        tracing::info!(live = counts.live, ceiling = counts.ceiling, "Connection accepted");
        metrics::set_active_sessions(counts.live);
        drop(counts);

        Some(AdmissionGuard {
            controller: self.clone(),
        })
    }

    /// Give back one slot.
    pub fn release(&self) {
        let mut counts = self.lock();
        counts.live = counts.live.saturating_sub(1);
        metrics::set_active_sessions(counts.live);
    }

    /// Stop admitting. Sessions already admitted keep running.
    pub fn close_admission(&self) {
        let mut counts = self.lock();
        if counts.ceiling != 0 {
            tracing::info!(live = counts.live, "Admission closed");
        }
        counts.ceiling = 0;
    }

    /// Current number of live sessions.
    pub fn live(&self) -> usize {
        self.lock().live
    }

    pub fn ceiling(&self) -> usize {
        self.lock().ceiling
    }
}

/// One admitted session. Dropping it calls [`AdmissionController::release`].
#[derive(Debug)]
pub struct AdmissionGuard {
    controller: AdmissionController,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.controller.release();
    }
}
