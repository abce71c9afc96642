//! Word-oriented reader/writer over a duplex byte stream.
//!
//! Used by both the server session handler and the client library.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::{ProtocolError, ProtocolResult};
use super::messages::{InitRequest, ENCRYPT_DATA, WORD_SIZE};

/// A protocol endpoint on one side of a channel.
#[derive(Debug)]
pub struct Channel<S> {
    stream: S,
    read_timeout: Option<Duration>,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
        }
    }

    /// Fail reads that stall longer than `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> ProtocolResult<()> {
        match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.stream.read_exact(buf)).await {
                Ok(res) => res.map(|_| ()).map_err(ProtocolError::from),
                Err(_) => Err(ProtocolError::Timeout {
                    secs: limit.as_secs(),
                }),
            },
            None => self.stream.read_exact(buf).await.map(|_| ()).map_err(ProtocolError::from),
        }
    }

    pub async fn read_word(&mut self) -> ProtocolResult<u32> {
        let mut buf = [0u8; WORD_SIZE];
        self.read_exact(&mut buf).await?;
        Ok(u32::from_ne_bytes(buf))
    }

    pub async fn read_bytes(&mut self, len: usize) -> ProtocolResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf).await?;
        Ok(buf)
    }

    pub async fn write_word(&mut self, word: u32) -> ProtocolResult<()> {
        self.stream.write_all(&word.to_ne_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn write_bytes(&mut self, bytes: &[u8]) -> ProtocolResult<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn read_init(&mut self) -> ProtocolResult<InitRequest> {
        let mut buf = [0u8; InitRequest::ENCODED_LEN];
        self.read_exact(&mut buf).await?;
        InitRequest::decode(&buf)
    }

    pub async fn write_init(&mut self, init: &InitRequest) -> ProtocolResult<()> {
        self.write_bytes(&init.encode()).await
    }

    /// Read one data packet.
    ///
    /// Returns `Ok(None)` when the peer closes the channel between packets
    /// or sends an empty payload; both end the stream cleanly.
    pub async fn read_chunk(&mut self, max_len: usize) -> ProtocolResult<Option<Vec<u8>>> {
        let command = match self.read_word().await {
            Ok(word) => word,
            Err(ProtocolError::ConnectionClosed) => return Ok(None),
            Err(e) => return Err(e),
        };
        if command != ENCRYPT_DATA {
            return Err(ProtocolError::UnexpectedCommand {
                expected: ENCRYPT_DATA,
                found: command,
            });
        }

        let len = self.read_word().await?;
        if len == 0 {
            return Ok(None);
        }
        if len as usize > max_len {
            return Err(ProtocolError::ChunkTooLarge { len, max: max_len });
        }

        self.read_bytes(len as usize).await.map(Some)
    }

    /// Write a data packet header and payload.
    pub async fn write_chunk(&mut self, payload: &[u8]) -> ProtocolResult<()> {
        let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::ChunkTooLarge {
            len: u32::MAX,
            max: u32::MAX as usize,
        })?;

        let mut buf = Vec::with_capacity(2 * WORD_SIZE + payload.len());
        buf.extend_from_slice(&ENCRYPT_DATA.to_ne_bytes());
        buf.extend_from_slice(&len.to_ne_bytes());
        buf.extend_from_slice(payload);
        self.write_bytes(&buf).await
    }

    /// Shut down the write half.
    pub async fn shutdown(&mut self) -> ProtocolResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
