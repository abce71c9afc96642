//! Server lifecycle: accept loop, session spawning and graceful shutdown.
//!
//! # Responsibilities
//! - Own the shared resources (job queue, worker pool, admission, credentials)
//! - Accept channel connections and spawn one session task each
//! - On shutdown: stop accepting, close admission, drain sessions, stop workers

pub mod table;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::credentials::CredentialGateway;
use crate::error::ServerError;
use crate::lifecycle::ShutdownSignal;
use crate::net::ChannelListener;
use crate::pipeline::{BoundedQueue, WorkerPool};
use crate::session::{self, AdmissionController, SessionContext};

use self::table::SessionTable;

/// Back-off after a failed accept, so a persistent error does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The encryption server.
#[derive(Debug)]
pub struct Server {
    config: Arc<ServerConfig>,
    ctx: SessionContext,
    listener: ChannelListener,
    pool: WorkerPool,
    sessions: SessionTable,
}

impl Server {
    /// Build all shared resources, start the workers and bind the channel.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn new(config: Arc<ServerConfig>, credentials: Arc<CredentialGateway>) -> Result<Self, ServerError> {
        let max_clients = config.limits.max_clients;

        let queue = Arc::new(BoundedQueue::new(max_clients)?);
        let listener = ChannelListener::bind(&config.channel.socket_path())?;
        let pool = WorkerPool::spawn(Arc::clone(&queue), config.limits.workers);

        let ctx = SessionContext {
            admission: AdmissionController::new(max_clients),
            credentials,
            queue,
            limits: config.session_limits(),
        };

        Ok(Self {
            config,
            ctx,
            listener,
            pool,
            sessions: SessionTable::new(max_clients),
        })
    }

    pub fn socket_path(&self) -> &Path {
        self.listener.path()
    }

    /// Accept clients until `shutdown` fires, then drain.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        tracing::info!(
            path = %self.listener.path().display(),
            max_clients = self.config.limits.max_clients,
            workers = self.pool.size(),
            "Server accepting clients"
        );

        let session_shutdown = shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(stream) => {
                        let ctx = self.ctx.clone();
                        self.sessions.insert(tokio::spawn(session::serve(stream, ctx, session_shutdown.clone())));
                        tracing::debug!(running = self.sessions.running(), "Session task spawned");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(self) {
        let Self {
            config,
            ctx,
            listener,
            pool,
            sessions,
        } = self;

        drop(listener);
        ctx.admission.close_admission();
        tracing::info!(
            target: crate::observability::CONSOLE_TARGET,
            live_sessions = ctx.admission.live(),
            "No more clients are accepted, waiting for sessions to finish"
        );

        let aborted = sessions.drain(config.timeouts.drain_timeout()).await;
        if aborted > 0 {
            tracing::warn!(aborted, "Sessions aborted at drain deadline");
        }

        pool.shutdown().await;
        tracing::info!("Server stopped");
    }
}
