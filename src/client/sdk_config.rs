//! Live configuration of the downstream client.
//!
//! # Responsibilities
//! - Hold the endpoint map the transport consults on every call
//! - Hold the credentials the transport signs with
//!
//! # Design Decisions
//! - Single writer: only activation publishes, and only once per run
//! - Readers take lock-free snapshots (`ArcSwap`), never a guard
//! - Injected explicitly into every component that needs it

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::endpoints::{EndpointMap, ServiceEndpoint};

/// Access key pair handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Shared client configuration.
#[derive(Debug, Default)]
pub struct SdkConfig {
    endpoints: ArcSwap<EndpointMap>,
    credentials: ArcSwapOption<Credentials>,
    publishes: AtomicUsize,
}

impl SdkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that already has credentials configured.
    pub fn with_credentials(credentials: Credentials) -> Self {
        let config = Self::new();
        config.credentials.store(Some(Arc::new(credentials)));
        config
    }

    /// Snapshot of the published endpoints.
    pub fn endpoints(&self) -> Arc<EndpointMap> {
        self.endpoints.load_full()
    }

    /// Published endpoint for `service`, if redirected.
    pub fn endpoint_for(&self, service: &str) -> Option<ServiceEndpoint> {
        self.endpoints.load().get(service).cloned()
    }

    pub fn credentials(&self) -> Option<Arc<Credentials>> {
        self.credentials.load_full()
    }

    /// Number of times endpoints were published.
    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    pub(crate) fn publish(&self, endpoints: EndpointMap) {
        let count = endpoints.len();
        self.endpoints.store(Arc::new(endpoints));
        self.publishes.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(services = count, "Endpoint configuration published");
    }

    pub(crate) fn set_credentials(&self, credentials: Credentials) {
        self.credentials.store(Some(Arc::new(credentials)));
    }
}
