//! Endpoint maps: loading, merging and the uniform scheme.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::config::loader::{ConfigError, EndpointFileError};
use crate::endpoints::ports::PortTable;

/// Redirect target for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub url: String,
    /// Path-style bucket addressing (S3 only).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_path_style: bool,
}

impl ServiceEndpoint {
    fn for_service(service: &str, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            force_path_style: service == "s3",
        }
    }
}

/// Lower-cased service identifier → endpoint.
///
/// A service without an entry keeps its original endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EndpointMap {
    entries: BTreeMap<String, ServiceEndpoint>,
}

impl EndpointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides as written in configuration.
    pub fn from_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut map = Self::new();
        for (service, url) in overrides {
            map.insert(service, url.clone());
        }
        map
    }

    /// Insert or replace the endpoint for `service` (case-insensitive).
    pub fn insert(&mut self, service: &str, url: impl Into<String>) {
        let key = service.to_ascii_lowercase();
        let endpoint = ServiceEndpoint::for_service(&key, url);
        self.entries.insert(key, endpoint);
    }

    pub fn get(&self, service: &str) -> Option<&ServiceEndpoint> {
        self.entries.get(&service.to_ascii_lowercase())
    }

    pub fn url(&self, service: &str) -> Option<&str> {
        self.get(service).map(|e| e.url.as_str())
    }

    pub fn contains(&self, service: &str) -> bool {
        self.get(service).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceEndpoint)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Endpoint table operations.
pub struct EndpointTable;

impl EndpointTable {
    /// Load overrides from a flat JSON object on disk.
    pub async fn load(path: &str) -> Result<EndpointMap, ConfigError> {
        tracing::debug!(path = %path, "Loading endpoint file");

        let invalid = |source: EndpointFileError| ConfigError::EndpointFile {
            path: path.to_string(),
            source,
        };

        let bytes = tokio::fs::read(Path::new(path))
            .await
            .map_err(|e| invalid(e.into()))?;
        let json: Value = serde_json::from_slice(&bytes).map_err(|e| invalid(e.into()))?;

        let Value::Object(object) = json else {
            return Err(invalid(EndpointFileError::NotFlat(
                "found a non-object document".to_string(),
            )));
        };

        let mut map = EndpointMap::new();
        for (service, value) in object {
            let Value::String(url) = value else {
                return Err(invalid(EndpointFileError::NotFlat(format!(
                    "value for {service:?} is not a string"
                ))));
            };
            map.insert(&service, url);
        }
        Ok(map)
    }

    /// Right-biased union: `overrides` wins per service.
    pub fn merge(base: &EndpointMap, overrides: &EndpointMap) -> EndpointMap {
        let mut merged = base.clone();
        for (service, endpoint) in overrides.iter() {
            merged.entries.insert(service.clone(), endpoint.clone());
        }
        merged
    }

    /// One `{base}:{port}` entry per known service.
    ///
    /// `base` is `scheme://host` without port or trailing slash.
    pub fn build_uniform(base: &str, ports: PortTable) -> EndpointMap {
        let base = base.trim_end_matches('/');
        let mut map = EndpointMap::new();
        for service in PortTable::services() {
            if let Some(port) = ports.port_for(service) {
                map.insert(service, format!("{base}:{port}"));
            }
        }
        map
    }
}
