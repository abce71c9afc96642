//! Fatal server errors and their process exit statuses.

use crate::config::ConfigError;
use crate::credentials::CredentialError;
use crate::net::ListenerError;
use crate::observability::logging::LoggingError;
use crate::pipeline::QueueError;

/// Errors that stop the whole process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not load credentials: {0}")]
    Credentials(#[from] CredentialError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("channel listener failed: {0}")]
    Listener(#[from] ListenerError),

    #[error("could not allocate resources: {0}")]
    Resources(#[from] QueueError),
}

impl ServerError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 3,
            Self::Credentials(_) => 1,
            Self::Logging(_) => 5,
            Self::Listener(_) => 1,
            Self::Resources(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_class() {
        assert_eq!(ServerError::from(QueueError::ZeroCapacity).exit_code(), 6);
        assert_eq!(ServerError::from(ConfigError::Validation(Vec::new())).exit_code(), 3);
        assert_eq!(ServerError::from(CredentialError::EmptyUsername).exit_code(), 1);
    }
}
