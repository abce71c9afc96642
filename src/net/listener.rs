//! Unix socket listener for the IPC channel.
//!
//! # Responsibilities
//! - Bind the configured channel path, clearing a stale socket file
//! - Accept incoming connections
//! - Remove the socket file when dropped
//!
//! Concurrency limits are not enforced here; admission happens in the
//! session handshake so a refused client still gets a REJECTED reply.

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use tokio::net::{UnixListener, UnixStream};

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to the channel path.
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to accept a connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// Listener bound to a filesystem socket path.
#[derive(Debug)]
pub struct ChannelListener {
    inner: UnixListener,
    path: PathBuf,
}

impl ChannelListener {
    /// Bind to `path`, creating the parent directory if needed.
    pub fn bind(path: &Path) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(bind_err)?;
        }

        remove_stale_socket(path).map_err(bind_err)?;

        let inner = UnixListener::bind(path).map_err(bind_err)?;

        tracing::info!(path = %path.display(), "Channel listener bound");

        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Accept the next client connection.
    pub async fn accept(&self) -> Result<UnixStream, ListenerError> {
        let (stream, _addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(path = %self.path.display(), "Client connected to the channel");
        Ok(stream)
    }

    /// Path this listener is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove a leftover socket at `path`. Anything that is not a socket is
/// left alone and reported as `AlreadyExists`.
fn remove_stale_socket(path: &Path) -> io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !metadata.file_type().is_socket() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a socket", path.display()),
        ));
    }
    std::fs::remove_file(path)?;
    tracing::debug!(path = %path.display(), "Removed stale socket file");
    Ok(())
}

impl Drop for ChannelListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove socket file");
            }
        }
    }
}
