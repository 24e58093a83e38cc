//! Configuration schema definitions.
//!
//! This module defines the plugin configuration block as the host hands it
//! over (`custom.localstack` in the service descriptor). All types derive
//! Serde traits and default every field, so an absent block is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::has_placeholder;

/// Stage used when nothing else names one.
pub const DEFAULT_STAGE: &str = "dev";

/// Effective plugin configuration after all layers are merged.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RedirectConfig {
    /// Base URL every known service is redirected to (e.g. "http://localhost").
    pub host: Option<String>,

    /// Single edge port shared by all services.
    #[serde(deserialize_with = "port_from_string_or_number")]
    pub edge_port: Option<u16>,

    /// Explicit per-service URL overrides (inline config merged with the endpoint file).
    pub endpoints: BTreeMap<String, String>,

    /// Path of a JSON file with additional per-service overrides.
    pub endpoint_file: Option<String>,

    /// Stages for which redirection is active. `None` means the default stage only.
    pub stages: Option<Vec<String>>,

    /// Effective stage. Computed by the resolver, never taken from input.
    #[serde(skip_deserializing)]
    pub stage: String,

    /// Enable debug-level logging.
    pub debug: bool,

    /// Ask the launcher to start the local service before activation.
    pub autostart: bool,

    /// Lambda specific options.
    pub lambda: LambdaConfig,

    /// Docker specific options.
    pub docker: DockerConfig,
}

impl RedirectConfig {
    /// Whether lambda code is mounted instead of packaged.
    pub fn should_mount_code(&self) -> bool {
        self.lambda.mount_code.is_enabled()
    }
}

/// Lambda options.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LambdaConfig {
    pub mount_code: MountCode,
}

/// `lambda.mountCode` accepts either a flag or a string.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MountCode {
    Flag(bool),
    Text(String),
}

impl MountCode {
    pub fn is_enabled(&self) -> bool {
        match self {
            MountCode::Flag(flag) => *flag,
            MountCode::Text(text) => {
                let text = text.trim();
                !text.is_empty() && !text.eq_ignore_ascii_case("false") && text != "0"
            }
        }
    }
}

impl Default for MountCode {
    fn default() -> Self {
        MountCode::Flag(false)
    }
}

/// Docker options.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DockerConfig {
    /// Run docker commands through sudo.
    pub sudo: bool,
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match Option::<RawPort>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPort::Number(port)) => Ok(Some(port)),
        Some(RawPort::Text(text)) if text.trim().is_empty() || has_placeholder(&text) => Ok(None),
        Some(RawPort::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid edgePort: {text:?}"))),
    }
}
