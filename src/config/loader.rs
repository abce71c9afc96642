//! Configuration loading from disk and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line; each one overrides the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub channel: Option<String>,
    pub socket: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub cred_file: Option<PathBuf>,
    pub max_clients: Option<usize>,
    pub workers: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(name) = self.channel {
            config.channel.name = name;
        }
        if let Some(path) = self.socket {
            config.channel.path = Some(path);
        }
        if let Some(file) = self.log_file {
            config.logging.file = file;
        }
        if let Some(file) = self.cred_file {
            config.credentials.file = file;
        }
        if let Some(n) = self.max_clients {
            config.limits.max_clients = n;
        }
        if let Some(n) = self.workers {
            config.limits.workers = n;
        }
    }
}

/// Load configuration from an optional TOML file, apply overrides, validate.
pub fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServerConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_beat_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        fs::write(&path, "[limits]\nmax_clients = 3\nworkers = 2\n").unwrap();

        let config = load_config(
            Some(&path),
            ConfigOverrides {
                workers: Some(6),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.limits.max_clients, 3);
        assert_eq!(config.limits.workers, 6);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let err = load_config(
            None,
            ConfigOverrides {
                max_clients: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("limits.max_clients"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[limits\n").unwrap();
        assert!(matches!(
            load_config(Some(&path), ConfigOverrides::default()),
            Err(ConfigError::Parse(_))
        ));
    }
}
