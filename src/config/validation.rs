//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and the layer loaders handle syntax)
//! - Validate value ranges (ports, timeouts)
//! - Check that the dev server URL can be formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into an instance

use thiserror::Error;

use crate::config::schema::Config;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("mode must not be empty")]
    EmptyMode,

    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("public_output_dir must not be empty")]
    EmptyPublicOutputDir,

    #[error("dev_server_connect_timeout must be a non-negative number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("dev server URL is invalid: {0}")]
    InvalidDevServerUrl(String),
}

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.mode.trim().is_empty() {
        errors.push(ValidationError::EmptyMode);
    }
    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if config.public_output_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyPublicOutputDir);
    }
    // An empty host already makes the URL unparseable.
    if errors.is_empty() {
        if let Err(e) = config.dev_server_url() {
            errors.push(ValidationError::InvalidDevServerUrl(e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
