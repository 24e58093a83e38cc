//! Configuration loading from disk.

use std::path::Path;

use thiserror::Error;

use crate::config::service::ServiceDescriptor;
use crate::config::validation::ValidationError;

/// Why an endpoint override file was rejected.
#[derive(Debug, Error)]
pub enum EndpointFileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a flat object of service names to URL strings, {0}")]
    NotFlat(String),
}

/// Error type for configuration loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Endpoint file \"{path}\" is invalid: {source}")]
    EndpointFile {
        path: String,
        #[source]
        source: EndpointFileError,
    },

    #[error("Invalid plugin configuration: {0}")]
    Layer(#[source] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Cannot read service file \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// The file this error is about, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::EndpointFile { path, .. } | ConfigError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a service descriptor from a TOML file.
pub fn load_service_file(path: &Path) -> Result<ServiceDescriptor, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let descriptor: ServiceDescriptor = toml::from_str(&content)?;

    tracing::debug!(path = %path.display(), "Service descriptor loaded");
    Ok(descriptor)
}
