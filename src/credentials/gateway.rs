//! Serialized access to the credential store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::store::{CredentialRecord, CredentialStore};

/// Mutex-guarded wrapper shared by every session and the operator console.
///
/// Each call holds the lock only for the duration of one store operation.
pub struct CredentialGateway {
    store: Mutex<Box<dyn CredentialStore>>,
}

impl CredentialGateway {
    pub fn new<S: CredentialStore + 'static>(store: S) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn CredentialStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check credentials; a match marks the user connected.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let ok = self.lock().authenticate(username, password);
        tracing::debug!(username, accepted = ok, "Credential check");
        ok
    }

    /// Report a finished session's usage and mark the user disconnected.
    pub fn record_usage_and_disconnect(&self, username: &str, bytes: u64) {
        if !self.lock().record_usage(username, bytes) {
            tracing::warn!(username, bytes, "Usage reported for unknown user");
        }
    }

    /// Snapshot of all records for the operator console.
    pub fn list_all(&self) -> Vec<CredentialRecord> {
        self.lock().snapshot()
    }
}

impl std::fmt::Debug for CredentialGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::store::MemoryCredentialStore;
    use std::sync::Arc;

    fn gateway() -> CredentialGateway {
        CredentialGateway::new(MemoryCredentialStore::from_pairs([("alice", "pw"), ("bob", "pw2")]).unwrap())
    }

    #[test]
    fn authenticate_and_list() {
        let gw = gateway();
        assert!(gw.authenticate("alice", "pw"));
        assert!(!gw.authenticate("bob", "pw"));

        let list = gw.list_all();
        assert_eq!(list.len(), 2);
        assert!(list[0].connected);
        assert!(!list[1].connected);
    }

    #[test]
    fn concurrent_usage_reports_are_not_lost() {
        let gw = Arc::new(gateway());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gw = gw.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        gw.record_usage_and_disconnect("alice", 3);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(gw.list_all()[0].bytes_encrypted, 8 * 1000 * 3);
    }
}
