//! Client for the encryption channel.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;

use crate::protocol::{AuthStatus, Channel, InitRequest, InitStatus, ProtocolError};

/// Errors returned to client callers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection rejected: server is at its client limit")]
    Rejected,
    #[error("authentication rejected")]
    AuthRejected,
    #[error("{field} is {len} bytes; must be 1..={max}", max = u32::MAX)]
    Field { field: &'static str, len: usize },
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// An authenticated session with the server.
#[derive(Debug)]
pub struct EncryptClient<S = UnixStream> {
    channel: Channel<S>,
}

impl EncryptClient<UnixStream> {
    /// Connect to the socket at `path` and complete the handshake.
    pub async fn connect(path: &Path, username: &str, password: &str, key: &[u8]) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path).await.map_err(ClientError::Connect)?;
        Self::handshake(stream, username, password, key).await
    }
}

fn field_len(field: &'static str, bytes: &[u8]) -> Result<u32, ClientError> {
    match u32::try_from(bytes.len()) {
        Ok(len) if len > 0 => Ok(len),
        _ => Err(ClientError::Field {
            field,
            len: bytes.len(),
        }),
    }
}

impl<S> EncryptClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run init, authentication and key exchange over an open stream.
    pub async fn handshake(stream: S, username: &str, password: &str, key: &[u8]) -> Result<Self, ClientError> {
        let init = InitRequest::new(
            field_len("username", username.as_bytes())?,
            field_len("password", password.as_bytes())?,
            field_len("key", key)?,
        );

        let mut channel = Channel::new(stream);
        channel.write_init(&init).await?;
        if InitStatus::try_from(channel.read_word().await?)? == InitStatus::Rejected {
            return Err(ClientError::Rejected);
        }

        channel.write_bytes(username.as_bytes()).await?;
        channel.write_bytes(password.as_bytes()).await?;
        if AuthStatus::try_from(channel.read_word().await?)? == AuthStatus::Rejected {
            return Err(ClientError::AuthRejected);
        }

        channel.write_bytes(key).await?;
        Ok(Self { channel })
    }

    /// Encrypt one chunk. The server continues the key stream across calls.
    ///
    /// An empty chunk is answered locally; on the wire it would end the session.
    pub async fn encrypt(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ClientError> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }
        self.channel.write_chunk(chunk).await?;
        Ok(self.channel.read_bytes(chunk.len()).await?)
    }

    /// End the session.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.channel.shutdown().await?;
        Ok(())
    }
}
