//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionLimits;

/// Subdirectory of the runtime directory that holds channel sockets.
const RUNTIME_SUBDIR: &str = "pipecrypt";

/// Root configuration for the encryption server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// IPC channel naming.
    pub channel: ChannelConfig,

    /// Log file and filter.
    pub logging: LoggingConfig,

    /// Credential file location.
    pub credentials: CredentialsConfig,

    /// Concurrency and size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Session limits derived from this configuration.
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_chunk_bytes: self.limits.max_chunk_bytes,
            max_field_bytes: self.limits.max_field_bytes,
            read_timeout: self.timeouts.read_timeout(),
        }
    }
}

/// IPC channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel name; the socket lives at `<runtime dir>/pipecrypt/<name>.sock`.
    pub name: String,

    /// Explicit socket path, overriding `name`.
    pub path: Option<PathBuf>,
}

impl ChannelConfig {
    /// Resolve the socket path.
    ///
    /// Priority:
    /// 1. `path` if set
    /// 2. `$XDG_RUNTIME_DIR/pipecrypt/<name>.sock`
    /// 3. `/tmp/pipecrypt/<name>.sock`
    pub fn socket_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        runtime_dir
            .join(RUNTIME_SUBDIR)
            .join(format!("{}.sock", self.name))
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "defaultpipename".to_string(),
            path: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file, truncated at startup.
    pub file: PathBuf,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("log.log"),
            filter: "pipecrypt=info".to_string(),
        }
    }
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Credential file (TOML).
    pub file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("cred.txt"),
        }
    }
}

/// Concurrency and size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrent sessions; also the job queue capacity.
    pub max_clients: usize,

    /// Number of encryption workers.
    pub workers: usize,

    /// Largest data chunk a client may send.
    pub max_chunk_bytes: usize,

    /// Largest username, password or key.
    pub max_field_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_clients: 8,
            workers: 4,
            max_chunk_bytes: 4096,
            max_field_bytes: 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-read timeout in seconds (0 = wait forever).
    pub read_secs: u64,

    /// How long shutdown waits for sessions to drain (0 = wait forever).
    pub drain_secs: u64,
}

impl TimeoutConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_secs > 0).then(|| Duration::from_secs(self.read_secs))
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_secs > 0).then(|| Duration::from_secs(self.drain_secs))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 0,
            drain_secs: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Prometheus endpoint bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.limits.max_clients, 8);
        assert_eq!(config.limits.workers, 4);
        assert_eq!(config.logging.file, PathBuf::from("log.log"));
        assert_eq!(config.credentials.file, PathBuf::from("cred.txt"));
        assert!(config.timeouts.read_timeout().is_none());
        assert!(config
            .channel
            .socket_path()
            .ends_with("pipecrypt/defaultpipename.sock"));
    }

    #[test]
    fn explicit_path_wins() {
        let channel = ChannelConfig {
            name: "ignored".into(),
            path: Some(PathBuf::from("/run/x.sock")),
        };
        assert_eq!(channel.socket_path(), PathBuf::from("/run/x.sock"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [limits]
            max_clients = 2

            [timeouts]
            read_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.max_clients, 2);
        assert_eq!(config.limits.workers, 4);
        assert_eq!(config.session_limits().read_timeout, Some(Duration::from_secs(30)));
    }
}
