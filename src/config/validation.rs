//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Numeric limits must be positive
//! - Paths and names must be non-empty
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the listener binds

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a positive integer")]
    NotPositive { field: &'static str },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} = {value} exceeds the protocol limit of {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

/// Check every rule and collect all failures.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("limits.max_clients", config.limits.max_clients),
        ("limits.workers", config.limits.workers),
        ("limits.max_chunk_bytes", config.limits.max_chunk_bytes),
        ("limits.max_field_bytes", config.limits.max_field_bytes),
    ] {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    // Lengths travel as 32-bit words.
    let word_max = u32::MAX as usize;
    for (field, value) in [
        ("limits.max_chunk_bytes", config.limits.max_chunk_bytes),
        ("limits.max_field_bytes", config.limits.max_field_bytes),
    ] {
        if value > word_max {
            errors.push(ValidationError::TooLarge {
                field,
                value,
                max: word_max,
            });
        }
    }

    let channel_unnamed = config.channel.name.trim().is_empty() && config.channel.path.is_none();
    if channel_unnamed {
        errors.push(ValidationError::Empty { field: "channel.name" });
    }
    if config.channel.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
        errors.push(ValidationError::Empty { field: "channel.path" });
    }
    if config.logging.file.as_os_str().is_empty() {
        errors.push(ValidationError::Empty { field: "logging.file" });
    }
    if config.credentials.file.as_os_str().is_empty() {
        errors.push(ValidationError::Empty { field: "credentials.file" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServerConfig::default();
        config.limits.max_clients = 0;
        config.limits.workers = 0;
        config.channel.name = "  ".into();
        config.credentials.file = "".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NotPositive { field: "limits.workers" }));
        assert!(errors.contains(&ValidationError::Empty { field: "channel.name" }));
    }
}
