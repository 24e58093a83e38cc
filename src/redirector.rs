//! Host-facing entry point.
//!
//! # Responsibilities
//! - Wire resolver, coordinator and interceptor around one shared client config
//! - Expose the host lifecycle trigger (`before_deploy`)
//! - Expose the capability registry for wrapping host functions

use std::sync::Arc;

use serde_json::Value;

use crate::client::SdkConfig;
use crate::config::{CliOptions, ConfigResolver, Environment, ProcessEnv, ServiceView};
use crate::error::InterceptError;
use crate::hooks::{Capability, CapabilityRegistry};
use crate::intercept::{RequestInterceptor, Transport};
use crate::lifecycle::{ActivationCoordinator, ActivationState, Launcher};
use crate::net::{ConnectivityProbe, HostnameResolver, TcpProbe};

/// Builder for [`Redirector`].
pub struct RedirectorBuilder<T: Transport> {
    service: Arc<dyn ServiceView>,
    transport: Arc<T>,
    cli: CliOptions,
    env: Arc<dyn Environment>,
    probe: Arc<dyn ConnectivityProbe>,
    launcher: Option<Arc<dyn Launcher>>,
    sdk: Arc<SdkConfig>,
}

impl<T: Transport> RedirectorBuilder<T> {
    pub fn cli(mut self, cli: CliOptions) -> Self {
        self.cli = cli;
        self
    }

    pub fn env(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Share an existing client config instead of a fresh one.
    pub fn sdk(mut self, sdk: Arc<SdkConfig>) -> Self {
        self.sdk = sdk;
        self
    }

    pub fn build(self) -> Redirector<T> {
        let capabilities = CapabilityRegistry::new();
        let mut coordinator = ActivationCoordinator::new(
            ConfigResolver::new(self.service, self.cli),
            self.sdk.clone(),
            self.env,
            HostnameResolver::new(self.probe),
            capabilities.clone(),
        );
        if let Some(launcher) = self.launcher {
            coordinator = coordinator.with_launcher(launcher);
        }
        let coordinator = Arc::new(coordinator);
        let interceptor =
            RequestInterceptor::new(self.transport, coordinator.clone(), self.sdk.clone());

        Redirector {
            interceptor,
            coordinator,
            capabilities,
            sdk: self.sdk,
        }
    }
}

/// Redirects a client's outbound calls to local endpoints.
pub struct Redirector<T: Transport> {
    interceptor: RequestInterceptor<T>,
    coordinator: Arc<ActivationCoordinator>,
    capabilities: CapabilityRegistry,
    sdk: Arc<SdkConfig>,
}

impl<T: Transport> Redirector<T> {
    pub fn builder(service: Arc<dyn ServiceView>, transport: Arc<T>) -> RedirectorBuilder<T> {
        RedirectorBuilder {
            service,
            transport,
            cli: CliOptions::default(),
            env: Arc::new(ProcessEnv),
            probe: Arc::new(TcpProbe),
            launcher: None,
            sdk: Arc::new(SdkConfig::new()),
        }
    }

    /// Host hook run before deployment resources are created.
    pub async fn before_deploy(&self) -> Result<ActivationState, InterceptError<T::Error>> {
        self.coordinator
            .ensure_activated(self.interceptor.original().as_ref())
            .await
    }

    /// Make an outbound call through the interceptor.
    pub async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, InterceptError<T::Error>> {
        self.interceptor.intercept(service, operation, params).await
    }

    /// The wrapped transport, for installing in place of the original.
    pub fn interceptor(&self) -> RequestInterceptor<T> {
        self.interceptor.clone()
    }

    /// Wrap a host capability so registered overrides apply to it.
    pub fn wrap_capability(&self, name: &str, original: Capability) -> Capability {
        self.capabilities.wrap(name, original)
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn coordinator(&self) -> &Arc<ActivationCoordinator> {
        &self.coordinator
    }

    pub fn sdk(&self) -> &Arc<SdkConfig> {
        &self.sdk
    }

    pub fn state(&self) -> ActivationState {
        self.coordinator.state()
    }
}
