//! Per-connection session handler.
//!
//! # Responsibilities
//! - Run handshake, authentication and key exchange on a fresh channel
//! - Feed each data chunk through the job queue, one job at a time
//! - Carry the key-stream offset from one chunk to the next
//! - Report usage and release admission when the channel closes
//! - Drop clients still silent in the handshake when the server shuts down
//!
//! # Design Decisions
//! - Transport failures and protocol violations end only this session
//! - The handler awaits each job before reading the next chunk, so a
//!   session never has two jobs in the queue

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::Instrument;

use crate::credentials::CredentialGateway;
use crate::lifecycle::ShutdownSignal;
use crate::net::{SessionId, SessionState};
use crate::observability::metrics;
use crate::pipeline::{BoundedQueue, Job};
use crate::protocol::{AuthStatus, Channel, InitRequest, InitStatus, ProtocolError};
use crate::session::admission::{AdmissionController, AdmissionGuard};

/// Per-session limits taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Largest accepted data chunk.
    pub max_chunk_bytes: usize,
    /// Largest accepted username, password or key.
    pub max_field_bytes: usize,
    /// Per-read timeout; `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 4096,
            max_field_bytes: 1024,
            read_timeout: None,
        }
    }
}

/// Shared resources every session needs.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub admission: AdmissionController,
    pub credentials: Arc<CredentialGateway>,
    pub queue: Arc<BoundedQueue<Job>>,
    pub limits: SessionLimits,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Client streamed and then closed the channel (or sent a terminating packet).
    Completed,
    /// Turned away because the admission ceiling was reached.
    Rejected,
    /// Wrong username or password.
    AuthRejected,
    /// Malformed message or wrong command tag.
    ProtocolViolation,
    /// Channel failed before streaming started.
    Disconnected,
    /// The worker pool went away mid-job.
    PipelineClosed,
    /// Server shut down before the client sent its init request.
    ShutDown,
}

/// Result of one session, for logging and tests.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: SessionId,
    pub username: Option<String>,
    pub bytes_encrypted: u64,
    pub outcome: SessionOutcome,
    pub last_state: SessionState,
}

struct Session<S> {
    id: SessionId,
    channel: Channel<S>,
    ctx: SessionContext,
    shutdown: ShutdownSignal,
    state: SessionState,
    username: Option<String>,
    bytes_encrypted: u64,
}

/// Serve one client channel to completion.
///
/// `shutdown` only matters before the handshake; admitted sessions run
/// until the client closes.
pub async fn serve<S>(stream: S, ctx: SessionContext, shutdown: ShutdownSignal) -> SessionSummary
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = SessionId::new();
    let span = tracing::info_span!("session", session_id = %id);
    let channel = Channel::new(stream).with_read_timeout(ctx.limits.read_timeout);

    let session = Session {
        id,
        channel,
        ctx,
        shutdown,
        state: SessionState::Connected,
        username: None,
        bytes_encrypted: 0,
    };
    session.run().instrument(span).await
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn run(mut self) -> SessionSummary {
        let (outcome, admission) = self.drive().await;
        self.close(outcome, admission).await
    }

    /// Walk the state machine until the session ends.
    ///
    /// The admission guard is handed back so it outlives usage reporting.
    async fn drive(&mut self) -> (SessionOutcome, Option<AdmissionGuard>) {
        let init = tokio::select! {
            init = self.channel.read_init() => init,
            _ = self.shutdown.recv() => {
                tracing::debug!("Shutdown before init request, closing channel");
                return (SessionOutcome::ShutDown, None);
            }
        };
        let init = match init {
            Ok(init) => init,
            Err(e) => return (self.failure(e), None),
        };

        let (init, admission) = match self.handshake(init).await {
            Ok(Some(accepted)) => accepted,
            Ok(None) => return (SessionOutcome::Rejected, None),
            Err(e) => return (self.failure(e), None),
        };

        match self.authenticate(&init).await {
            Ok(true) => {}
            Ok(false) => return (SessionOutcome::AuthRejected, Some(admission)),
            Err(e) => return (self.failure(e), Some(admission)),
        }

        let key = match self.channel.read_bytes(init.key_len as usize).await {
            Ok(key) => Arc::<[u8]>::from(key),
            Err(e) => {
                tracing::info!(error = %e, "Could not get encryption key");
                return (self.failure(e), Some(admission));
            }
        };
        self.state = SessionState::KeyExchanged;

        (self.stream(key).await, Some(admission))
    }

    /// CONNECTED → HANDSHAKEN.
    async fn handshake(&mut self, init: InitRequest) -> Result<Option<(InitRequest, AdmissionGuard)>, ProtocolError> {
        let max = self.ctx.limits.max_field_bytes;
        for (field, len) in [
            ("username", init.username_len),
            ("password", init.password_len),
            ("key", init.key_len),
        ] {
            if len == 0 || len as usize > max {
                return Err(ProtocolError::FieldLength { field, len, max });
            }
        }

        let Some(guard) = self.ctx.admission.try_admit() else {
            metrics::record_session("rejected");
            self.channel.write_word(InitStatus::Rejected.word()).await?;
            return Ok(None);
        };

        self.channel.write_word(InitStatus::Accepted.word()).await?;
        metrics::record_session("admitted");
        self.state = SessionState::Handshaken;
        Ok(Some((init, guard)))
    }

    /// HANDSHAKEN → AUTHENTICATED. `Ok(false)` means the credentials were refused.
    async fn authenticate(&mut self, init: &InitRequest) -> Result<bool, ProtocolError> {
        let username = self.channel.read_bytes(init.username_len as usize).await?;
        let password = self.channel.read_bytes(init.password_len as usize).await?;

        let credentials = match (String::from_utf8(username), String::from_utf8(password)) {
            (Ok(u), Ok(p)) => Some((u, p)),
            _ => None,
        };
        let accepted = match &credentials {
            Some((username, password)) => self.ctx.credentials.authenticate(username, password),
            None => false,
        };

        let status = if accepted {
            AuthStatus::Successful
        } else {
            AuthStatus::Rejected
        };
        self.channel.write_word(status.word()).await?;

        if !accepted {
            tracing::info!("Access denied for client");
            metrics::record_session("auth_rejected");
            return Ok(false);
        }

        let username = credentials.map(|(u, _)| u);
        tracing::info!(username = ?username, "Client successfully authenticated");
        self.username = username;
        self.state = SessionState::Authenticated;
        Ok(true)
    }

    /// KEY_EXCHANGED → STREAMING, until the channel ends.
    async fn stream(&mut self, key: Arc<[u8]>) -> SessionOutcome {
        self.state = SessionState::Streaming;
        let mut offset = 0usize;

        loop {
            let payload = match self.channel.read_chunk(self.ctx.limits.max_chunk_bytes).await {
                Ok(Some(payload)) => payload,
                Ok(None) => return SessionOutcome::Completed,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!(error = %e, "Channel ended");
                    return SessionOutcome::Completed;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ending session on invalid packet");
                    return SessionOutcome::ProtocolViolation;
                }
            };
            let len = payload.len();

            let (job, handle) = Job::new(self.id, payload, Arc::clone(&key), offset);
            if self.ctx.queue.push(job).await.is_err() {
                tracing::warn!("Job queue closed");
                return SessionOutcome::PipelineClosed;
            }
            let done = match handle.wait().await {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!(error = %e, "Encryption did not complete");
                    return SessionOutcome::PipelineClosed;
                }
            };

            offset = done.offset();
            if let Err(e) = self.channel.write_bytes(&done.into_payload()).await {
                tracing::debug!(error = %e, "Failed to send encrypted chunk");
                return SessionOutcome::Completed;
            }
            self.bytes_encrypted += len as u64;
            tracing::trace!(bytes = len, offset, "Chunk encrypted");
        }
    }

    fn failure(&self, e: ProtocolError) -> SessionOutcome {
        if e.is_disconnect() {
            tracing::debug!(state = %self.state, error = %e, "Channel closed during setup");
            SessionOutcome::Disconnected
        } else {
            tracing::warn!(state = %self.state, error = %e, "Protocol violation");
            SessionOutcome::ProtocolViolation
        }
    }

    /// → CLOSED.
    async fn close(mut self, outcome: SessionOutcome, admission: Option<AdmissionGuard>) -> SessionSummary {
        let last_state = self.state;
        if let Err(e) = self.channel.shutdown().await {
            tracing::trace!(error = %e, "Channel shutdown failed");
        }

        if let Some(username) = &self.username {
            self.ctx
                .credentials
                .record_usage_and_disconnect(username, self.bytes_encrypted);
            metrics::record_bytes(self.bytes_encrypted);
        }
        drop(admission);

        self.state = SessionState::Closed;
        tracing::info!(
            outcome = ?outcome,
            last_state = %last_state,
            bytes = self.bytes_encrypted,
            "Session closed"
        );

        SessionSummary {
            id: self.id,
            username: self.username,
            bytes_encrypted: self.bytes_encrypted,
            outcome,
            last_state,
        }
    }
}
