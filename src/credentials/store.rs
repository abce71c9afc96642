//! Credential storage.
//!
//! The server only depends on the [`CredentialStore`] trait. The default
//! [`MemoryCredentialStore`] keeps records in memory and is loaded once at
//! startup from a TOML file:
//!
//! ```toml
//! [[users]]
//! username = "alice"
//! password = "wonderland"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Public view of one credential record. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRecord {
    pub username: String,
    pub bytes_encrypted: u64,
    pub connected: bool,
}

/// Backing store for usernames, passwords and usage statistics.
///
/// Implementations need no internal locking; the gateway serializes calls.
pub trait CredentialStore: Send {
    /// Check a username/password pair. A match marks the user connected.
    fn authenticate(&mut self, username: &str, password: &str) -> bool;

    /// Add `bytes` to the user's total and end one of their sessions.
    /// The user shows as disconnected once every session has reported.
    ///
    /// Returns `false` if the user is unknown.
    fn record_usage(&mut self, username: &str, bytes: u64) -> bool;

    /// All records, sorted by username.
    fn snapshot(&self) -> Vec<CredentialRecord>;
}

/// Errors loading a credential file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to read credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate username {0:?} in credential file")]
    Duplicate(String),
    #[error("empty username in credential file")]
    EmptyUsername,
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    password: String,
}

#[derive(Debug)]
struct Entry {
    password: String,
    bytes_encrypted: u64,
    /// Authenticated sessions not yet reported.
    live_sessions: usize,
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: HashMap<String, Entry>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(username, password)` pairs.
    pub fn from_pairs<I, U, P>(pairs: I) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let mut store = Self::new();
        for (username, password) in pairs {
            store.insert(username.into(), password.into())?;
        }
        Ok(store)
    }

    /// Load from a TOML credential file.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|e| match e {
            CredentialError::Parse { source, .. } => CredentialError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    fn parse(content: &str) -> Result<Self, CredentialError> {
        let file: CredentialFile = toml::from_str(content).map_err(|source| CredentialError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        Self::from_pairs(file.users.into_iter().map(|u| (u.username, u.password)))
    }

    fn insert(&mut self, username: String, password: String) -> Result<(), CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        if self.users.contains_key(&username) {
            return Err(CredentialError::Duplicate(username));
        }
        self.users.insert(
            username,
            Entry {
                password,
                bytes_encrypted: 0,
                live_sessions: 0,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn authenticate(&mut self, username: &str, password: &str) -> bool {
        match self.users.get_mut(username) {
            Some(entry) if entry.password == password => {
                entry.live_sessions += 1;
                true
            }
            _ => false,
        }
    }

    fn record_usage(&mut self, username: &str, bytes: u64) -> bool {
        match self.users.get_mut(username) {
            Some(entry) => {
                entry.bytes_encrypted = entry.bytes_encrypted.saturating_add(bytes);
                entry.live_sessions = entry.live_sessions.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<CredentialRecord> {
        let mut records: Vec<_> = self
            .users
            .iter()
            .map(|(username, entry)| CredentialRecord {
                username: username.clone(),
                bytes_encrypted: entry.bytes_encrypted,
                connected: entry.live_sessions > 0,
            })
            .collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        records
    }
}
