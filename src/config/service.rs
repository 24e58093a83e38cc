//! The host's view of the surrounding service.
//!
//! The host framework renders its declarative service file in several
//! passes, so values read early may still hold `${...}` placeholders.
//! [`SharedService`] lets the host publish each re-rendered descriptor;
//! readers always observe the latest one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read access to the parts of the service descriptor the redirector needs.
pub trait ServiceView: Send + Sync {
    /// The `custom.localstack` block, if present.
    fn plugin_config(&self) -> Option<Value>;

    /// `custom.stage`.
    fn custom_stage(&self) -> Option<String>;

    /// `provider.stage`.
    fn provider_stage(&self) -> Option<String>;

    /// `provider.deploymentBucket`.
    fn deployment_bucket(&self) -> Option<String>;
}

/// Service descriptor as declared by the host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceDescriptor {
    pub provider: ProviderSection,
    pub custom: CustomSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSection {
    pub stage: Option<String>,
    pub deployment_bucket: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomSection {
    pub stage: Option<String>,
    pub localstack: Option<Value>,
}

impl ServiceDescriptor {
    /// Descriptor with only a plugin block.
    pub fn with_plugin_config(block: Value) -> Self {
        Self {
            custom: CustomSection {
                localstack: Some(block),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl ServiceView for ServiceDescriptor {
    fn plugin_config(&self) -> Option<Value> {
        self.custom.localstack.clone()
    }

    fn custom_stage(&self) -> Option<String> {
        self.custom.stage.clone()
    }

    fn provider_stage(&self) -> Option<String> {
        self.provider.stage.clone()
    }

    fn deployment_bucket(&self) -> Option<String> {
        self.provider.deployment_bucket.clone()
    }
}

/// A descriptor the host can replace while the redirector holds it.
#[derive(Debug)]
pub struct SharedService {
    current: ArcSwap<ServiceDescriptor>,
}

impl SharedService {
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            current: ArcSwap::from_pointee(descriptor),
        }
    }

    /// Publish a newly rendered descriptor.
    pub fn update(&self, descriptor: ServiceDescriptor) {
        self.current.store(Arc::new(descriptor));
        tracing::debug!("Service descriptor updated");
    }

    /// The descriptor as of now.
    pub fn snapshot(&self) -> Arc<ServiceDescriptor> {
        self.current.load_full()
    }
}

impl ServiceView for SharedService {
    fn plugin_config(&self) -> Option<Value> {
        self.current.load().plugin_config()
    }

    fn custom_stage(&self) -> Option<String> {
        self.current.load().custom_stage()
    }

    fn provider_stage(&self) -> Option<String> {
        self.current.load().provider_stage()
    }

    fn deployment_bucket(&self) -> Option<String> {
        self.current.load().deployment_bucket()
    }
}
