//! Message layouts and wire constants.
//!
//! All integers are 32-bit words in native byte order; client and server
//! run on the same host.

use super::error::ProtocolError;

/// Size of one protocol word in bytes.
pub const WORD_SIZE: usize = std::mem::size_of::<u32>();

/// Command tag opening a connection.
pub const INITIALIZE_CONNECTION: u32 = 1;
/// Command tag of a data chunk.
pub const ENCRYPT_DATA: u32 = 2;

pub const CONNECTION_ACCEPTED: u32 = 100;
pub const CONNECTION_REJECTED: u32 = 101;
pub const AUTH_SUCCESSFUL: u32 = 200;
pub const AUTH_REJECTED: u32 = 201;

/// Init request: command word followed by three byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitRequest {
    pub username_len: u32,
    pub password_len: u32,
    pub key_len: u32,
}

impl InitRequest {
    /// Encoded size including the command word.
    pub const ENCODED_LEN: usize = 4 * WORD_SIZE;

    pub fn new(username_len: u32, password_len: u32, key_len: u32) -> Self {
        Self {
            username_len,
            password_len,
            key_len,
        }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        let words = [INITIALIZE_CONNECTION, self.username_len, self.password_len, self.key_len];
        for (slot, word) in buf.chunks_exact_mut(WORD_SIZE).zip(words) {
            slot.copy_from_slice(&word.to_ne_bytes());
        }
        buf
    }

    /// Decode and check the command tag.
    pub fn decode(buf: &[u8; Self::ENCODED_LEN]) -> Result<Self, ProtocolError> {
        let mut words = buf
            .chunks_exact(WORD_SIZE)
            .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]));
        let mut next = || words.next().unwrap_or_default();

        let command = next();
        if command != INITIALIZE_CONNECTION {
            return Err(ProtocolError::UnexpectedCommand {
                expected: INITIALIZE_CONNECTION,
                found: command,
            });
        }

        Ok(Self {
            username_len: next(),
            password_len: next(),
            key_len: next(),
        })
    }
}

/// Server reply to an init request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Accepted,
    Rejected,
}

impl InitStatus {
    pub fn word(self) -> u32 {
        match self {
            Self::Accepted => CONNECTION_ACCEPTED,
            Self::Rejected => CONNECTION_REJECTED,
        }
    }
}

impl TryFrom<u32> for InitStatus {
    type Error = ProtocolError;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        match word {
            CONNECTION_ACCEPTED => Ok(Self::Accepted),
            CONNECTION_REJECTED => Ok(Self::Rejected),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

/// Server reply to credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Successful,
    Rejected,
}

impl AuthStatus {
    pub fn word(self) -> u32 {
        match self {
            Self::Successful => AUTH_SUCCESSFUL,
            Self::Rejected => AUTH_REJECTED,
        }
    }
}

impl TryFrom<u32> for AuthStatus {
    type Error = ProtocolError;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        match word {
            AUTH_SUCCESSFUL => Ok(Self::Successful),
            AUTH_REJECTED => Ok(Self::Rejected),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_request_layout() {
        let req = InitRequest::new(5, 6, 3);
        let buf = req.encode();
        assert_eq!(&buf[..4], &INITIALIZE_CONNECTION.to_ne_bytes());
        assert_eq!(&buf[12..], &3u32.to_ne_bytes());
        assert_eq!(InitRequest::decode(&buf).unwrap(), req);
    }

    #[test]
    fn init_request_wrong_command() {
        let mut buf = InitRequest::new(1, 1, 1).encode();
        buf[..4].copy_from_slice(&ENCRYPT_DATA.to_ne_bytes());
        let err = InitRequest::decode(&buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedCommand { expected: INITIALIZE_CONNECTION, found: ENCRYPT_DATA }
        ));
    }

    #[test]
    fn status_words() {
        assert_eq!(InitStatus::try_from(CONNECTION_REJECTED).unwrap(), InitStatus::Rejected);
        assert_eq!(AuthStatus::try_from(AuthStatus::Successful.word()).unwrap(), AuthStatus::Successful);
        assert!(AuthStatus::try_from(CONNECTION_ACCEPTED).is_err());
    }
}
