//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - `host` and every endpoint override must be absolute http(s) URLs
//! - Stage names must be non-empty
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::RedirectConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host {value:?} is not a valid URL: {reason}")]
    Host { value: String, reason: String },

    #[error("endpoint for {service} ({value:?}) is not a valid URL: {reason}")]
    Endpoint {
        service: String,
        value: String,
        reason: String,
    },

    #[error("stages contains an empty stage name")]
    EmptyStage,
}

/// Check that `value` is an absolute http or https URL.
pub fn check_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other:?}")),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

pub fn validate_config(config: &RedirectConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(host) = &config.host {
        if let Err(reason) = check_url(host) {
            errors.push(ValidationError::Host {
                value: host.clone(),
                reason,
            });
        }
    }

    for (service, value) in &config.endpoints {
        if let Err(reason) = check_url(value) {
            errors.push(ValidationError::Endpoint {
                service: service.clone(),
                value: value.clone(),
                reason,
            });
        }
    }

    if let Some(stages) = &config.stages {
        if stages.iter().any(|s| s.trim().is_empty()) {
            errors.push(ValidationError::EmptyStage);
        }
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
    fn test_valid_config() {
        let mut config = RedirectConfig::default();
        config.host = Some("http://localhost".into());
        config
            .endpoints
            .insert("S3".into(), "http://localhost:4572".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RedirectConfig::default();
        config.host = Some("localhost".into());
        config.endpoints.insert("sqs".into(), "ftp://queue".into());
        config.stages = Some(vec!["".into()]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::Host { .. }));
        assert!(matches!(errors[1], ValidationError::Endpoint { ref service, .. } if service == "sqs"));
        assert_eq!(errors[2], ValidationError::EmptyStage);
    }
}
