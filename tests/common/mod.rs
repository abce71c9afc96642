//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pipecrypt::credentials::{CredentialGateway, CredentialRecord, MemoryCredentialStore};
use pipecrypt::lifecycle::Shutdown;
use pipecrypt::{ServerConfig, Server, ServerError};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// A server running on a socket inside a temporary directory.
pub struct TestServer {
    pub socket: PathBuf,
    pub credentials: Arc<CredentialGateway>,
    pub shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
    _dir: TempDir,
}

/// Config pointing every path into `dir`.
pub fn test_config(dir: &Path, max_clients: usize, workers: usize) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.channel.path = Some(dir.join("pipecrypt.sock"));
    config.logging.file = dir.join("server.log");
    config.credentials.file = dir.join("cred.toml");
    config.limits.max_clients = max_clients;
    config.limits.workers = workers;
    config
}

/// Start a server that knows the users in `users`.
pub async fn start_server(users: &[(&str, &str)], max_clients: usize, workers: usize) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), max_clients, workers);
    start_with_config(dir, config, users).await
}

pub async fn start_with_config(dir: TempDir, config: ServerConfig, users: &[(&str, &str)]) -> TestServer {
    let store = MemoryCredentialStore::from_pairs(users.iter().copied()).unwrap();
    let credentials = Arc::new(CredentialGateway::new(store));

    let server = Server::new(Arc::new(config), Arc::clone(&credentials)).unwrap();
    let socket = server.socket_path().to_path_buf();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(shutdown.subscribe()));

    TestServer {
        socket,
        credentials,
        shutdown,
        handle,
        _dir: dir,
    }
}

impl TestServer {
    pub fn record(&self, username: &str) -> CredentialRecord {
        self.credentials
            .list_all()
            .into_iter()
            .find(|r| r.username == username)
            .unwrap()
    }

    /// Trigger shutdown and wait for the drain to complete.
    pub async fn stop(self) -> Arc<CredentialGateway> {
        self.shutdown.trigger();
        with_timeout(self.handle).await.unwrap().unwrap();
        self.credentials
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Fail the test instead of hanging when `fut` does not complete.
pub async fn with_timeout<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation timed out")
}

/// Poll `check` until it holds or five seconds pass.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) {
    with_timeout(async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
