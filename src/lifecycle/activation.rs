//! Lazy, once-only activation.
//!
//! # States
//! ```text
//! Uninitialized ──trigger──▶ Activating ──active──▶ Activated   (terminal)
//!       ▲                        │ ──inactive──▶ Inactive       (terminal)
//!       │                        │ ──config error──▶ Failed     (terminal)
//!       └──deferred / side effect failed──┘
//! ```
//!
//! # Design Decisions
//! - Activation is a single in-flight operation behind a once-cell latch;
//!   concurrent triggers wait for it instead of starting another
//! - A configuration error closes the latch; later triggers get the same error
//! - Deferred resolution and failed side effects leave the latch open
//! - Every side effect is recorded by name and never repeated

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use url::Url;

use crate::client::SdkConfig;
use crate::config::env::{Environment, AWS_ENDPOINT_URL, EDGE_PORT, LOCALSTACK_HOSTNAME, USE_SSL};
use crate::config::validation::check_url;
use crate::config::{ConfigError, ConfigResolver, RedirectConfig, Resolution};
use crate::endpoints::{EndpointMap, EndpointTable, PortTable};
use crate::error::InterceptError;
use crate::hooks::{mount_code, CapabilityRegistry, HookError};
use crate::intercept::Transport;
use crate::lifecycle::bucket::ensure_deployment_bucket;
use crate::lifecycle::credentials::ensure_credentials;
use crate::lifecycle::launcher::Launcher;
use crate::lifecycle::side_effects::{
    SideEffects, AUTOSTART, CONFIGURE_CREDENTIALS, DEPLOYMENT_BUCKET, INSTALL_OVERRIDES,
    PUBLISH_ENDPOINTS,
};
use crate::net::{HostnameResolver, LOOPBACK_NAME};
use crate::observability::metrics;

/// Activation state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Uninitialized = 0,
    Activating = 1,
    Activated = 2,
    Inactive = 3,
    Failed = 4,
}

impl From<u8> for ActivationState {
    fn from(val: u8) -> Self {
        match val {
            1 => ActivationState::Activating,
            2 => ActivationState::Activated,
            3 => ActivationState::Inactive,
            4 => ActivationState::Failed,
            _ => ActivationState::Uninitialized,
        }
    }
}

impl ActivationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationState::Uninitialized => "uninitialized",
            ActivationState::Activating => "activating",
            ActivationState::Activated => "activated",
            ActivationState::Inactive => "inactive",
            ActivationState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActivationState::Activated | ActivationState::Inactive | ActivationState::Failed
        )
    }
}

/// Terminal outcome of activation.
#[derive(Debug, Clone)]
pub struct Activation {
    pub state: ActivationState,
    /// Configuration the decision was made on. Endpoints are cleared when inactive.
    pub config: RedirectConfig,
}

/// What the latch holds once closed.
type Settled = Result<Activation, Arc<ConfigError>>;

enum Pending<E> {
    Deferred,
    Failed(InterceptError<E>),
}

/// Port assignment: `EDGE_PORT` > `edgePort` > port of the base URL > legacy table.
pub fn port_table(config: &RedirectConfig, env: &dyn Environment, base: Option<&Url>) -> PortTable {
    if let Some(port) = env.var(EDGE_PORT).and_then(|p| p.trim().parse().ok()) {
        return PortTable::Edge(port);
    }
    if let Some(port) = config.edge_port {
        return PortTable::Edge(port);
    }
    if let Some(port) = base.and_then(Url::port) {
        return PortTable::Edge(port);
    }
    PortTable::Legacy
}

/// Endpoint map for an active configuration: the uniform scheme for every
/// known service, overlaid with the explicit overrides.
pub async fn local_endpoints(
    config: &RedirectConfig,
    env: &dyn Environment,
    hostnames: &HostnameResolver,
) -> EndpointMap {
    let configured = config.host.as_deref().and_then(|h| check_url(h).ok());
    let from_env = env.var(AWS_ENDPOINT_URL).and_then(|raw| match check_url(&raw) {
        Ok(url) => Some(url),
        Err(reason) => {
            tracing::warn!(value = %raw, reason = %reason, "Ignoring invalid {}", AWS_ENDPOINT_URL);
            None
        }
    });
    let base = configured.or(from_env);
    let ports = port_table(config, env, base.as_ref());

    let (scheme, host) = match &base {
        Some(url) => (
            url.scheme().to_string(),
            url.host_str().unwrap_or(LOOPBACK_NAME).to_string(),
        ),
        None => {
            let scheme = if env.flag(USE_SSL) { "https" } else { "http" };
            let host = env
                .var(LOCALSTACK_HOSTNAME)
                .unwrap_or_else(|| LOOPBACK_NAME.to_string());
            (scheme.to_string(), host)
        }
    };

    let hostname = hostnames
        .resolve(Some(host.as_str()), LOOPBACK_NAME, ports.probe_port())
        .await;
    let uniform = EndpointTable::build_uniform(&format!("{scheme}://{hostname}"), ports);
    let overrides = EndpointMap::from_overrides(&config.endpoints);
    let endpoints = EndpointTable::merge(&uniform, &overrides);

    if config.debug {
        for (service, endpoint) in endpoints.iter() {
            tracing::info!(service = %service, url = %endpoint.url, "Reconfiguring service");
        }
    }
    endpoints
}

/// Gates every irreversible side effect behind one activation decision.
pub struct ActivationCoordinator {
    resolver: ConfigResolver,
    sdk: Arc<SdkConfig>,
    env: Arc<dyn Environment>,
    hostnames: HostnameResolver,
    capabilities: CapabilityRegistry,
    launcher: Option<Arc<dyn Launcher>>,
    state: AtomicU8,
    outcome: OnceCell<Settled>,
    effects: SideEffects,
}

impl ActivationCoordinator {
    pub fn new(
        resolver: ConfigResolver,
        sdk: Arc<SdkConfig>,
        env: Arc<dyn Environment>,
        hostnames: HostnameResolver,
        capabilities: CapabilityRegistry,
    ) -> Self {
        Self {
            resolver,
            sdk,
            env,
            hostnames,
            capabilities,
            launcher: None,
            state: AtomicU8::new(ActivationState::Uninitialized as u8),
            outcome: OnceCell::new(),
            effects: SideEffects::new(),
        }
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn state(&self) -> ActivationState {
        ActivationState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ActivationState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Terminal outcome, once activation settled on a stage decision.
    pub fn outcome(&self) -> Option<&Activation> {
        self.outcome.get().and_then(|settled| settled.as_ref().ok())
    }

    /// The configuration error activation stopped on, if any.
    pub fn failure(&self) -> Option<&ConfigError> {
        self.outcome
            .get()
            .and_then(|settled| settled.as_ref().err())
            .map(|e| e.as_ref())
    }

    pub fn side_effects(&self) -> &SideEffects {
        &self.effects
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn hostnames(&self) -> &HostnameResolver {
        &self.hostnames
    }

    /// Run activation unless it already reached a terminal state.
    ///
    /// `transport` is the original (unwrapped) call entrypoint, used for the
    /// deployment bucket bootstrap.
    pub async fn ensure_activated<T>(
        &self,
        transport: &T,
    ) -> Result<ActivationState, InterceptError<T::Error>>
    where
        T: Transport + ?Sized,
    {
        let settled = match self.outcome.get() {
            Some(settled) => settled,
            None => match self.outcome.get_or_try_init(|| self.activate(transport)).await {
                Ok(settled) => settled,
                Err(Pending::Deferred) => return Ok(ActivationState::Uninitialized),
                Err(Pending::Failed(e)) => return Err(e),
            },
        };

        match settled {
            Ok(activation) => Ok(activation.state),
            Err(e) => Err(InterceptError::Config(e.clone())),
        }
    }

    async fn activate<T>(&self, transport: &T) -> Result<Settled, Pending<T::Error>>
    where
        T: Transport + ?Sized,
    {
        self.set_state(ActivationState::Activating);

        let resolution = match self.resolver.resolve().await {
            Ok(resolution) => resolution,
            Err(e) => {
                self.set_state(ActivationState::Failed);
                tracing::error!(error = %e, "Configuration resolution failed");
                metrics::record_activation(ActivationState::Failed);
                return Ok(Err(Arc::new(e)));
            }
        };

        let mut config = match resolution {
            Resolution::Ready(config) => config,
            Resolution::Deferred { endpoint_file } => {
                self.set_state(ActivationState::Uninitialized);
                tracing::debug!(endpoint_file = %endpoint_file, "Activation deferred");
                return Err(Pending::Deferred);
            }
        };

        if !self.resolver.is_active(&config) {
            config.endpoints.clear();
            tracing::info!(
                stages = ?config.stages,
                stage = %config.stage,
                "Skipping local endpoints for this stage"
            );
            self.set_state(ActivationState::Inactive);
            metrics::record_activation(ActivationState::Inactive);
            return Ok(Ok(Activation {
                state: ActivationState::Inactive,
                config,
            }));
        }

        tracing::info!(stage = %config.stage, "Using local endpoints");
        if let Err(e) = self.apply(&config, transport).await {
            self.set_state(ActivationState::Uninitialized);
            tracing::error!(error = %e, "Activation failed");
            return Err(Pending::Failed(e));
        }

        self.set_state(ActivationState::Activated);
        metrics::record_activation(ActivationState::Activated);
        Ok(Ok(Activation {
            state: ActivationState::Activated,
            config,
        }))
    }

    async fn apply<T>(
        &self,
        config: &RedirectConfig,
        transport: &T,
    ) -> Result<(), InterceptError<T::Error>>
    where
        T: Transport + ?Sized,
    {
        if config.autostart {
            self.effects
                .run_once_async(AUTOSTART, || async {
                    match &self.launcher {
                        Some(launcher) => launcher.ensure_running(config).await,
                        None => {
                            tracing::info!("autostart requested but no launcher is configured");
                            Ok(())
                        }
                    }
                })
                .await?;
        }

        self.effects
            .run_once::<HookError>(CONFIGURE_CREDENTIALS, || {
                ensure_credentials(&self.sdk, self.env.as_ref());
                Ok(())
            })?;

        if !self.effects.has_run(PUBLISH_ENDPOINTS) {
            let endpoints = local_endpoints(config, self.env.as_ref(), &self.hostnames).await;
            self.effects.run_once::<HookError>(PUBLISH_ENDPOINTS, || {
                self.sdk.publish(endpoints);
                Ok(())
            })?;
        }

        self.effects.run_once(INSTALL_OVERRIDES, || {
            mount_code::install(&self.capabilities, config, self.env.as_ref()).map(|_| ())
        })?;

        if let Some(bucket) = self.resolver.service().deployment_bucket() {
            self.effects
                .run_once_async(DEPLOYMENT_BUCKET, || async {
                    ensure_deployment_bucket(transport, &bucket)
                        .await
                        .map(|_| ())
                        .map_err(InterceptError::Transport)
                })
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliOptions, MapEnv, ServiceDescriptor};
    use crate::net::ConnectivityProbe;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct Unreachable;

    #[async_trait]
    impl ConnectivityProbe for Unreachable {
        async fn reachable(&self, _host: &str, _port: u16, _timeout: Duration) -> bool {
            false
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    struct Offline;

    struct OfflineTransport;

    #[async_trait]
    impl Transport for OfflineTransport {
        type Error = Offline;

        async fn request(&self, _s: &str, _o: &str, _p: Value) -> Result<Value, Offline> {
            Err(Offline)
        }
    }

    fn hostnames() -> HostnameResolver {
        HostnameResolver::new(Arc::new(Unreachable))
    }

    fn coordinator(block: Value, cli: CliOptions, env: MapEnv) -> ActivationCoordinator {
        let service = Arc::new(ServiceDescriptor::with_plugin_config(block));
        ActivationCoordinator::new(
            ConfigResolver::new(service, cli),
            Arc::new(SdkConfig::new()),
            Arc::new(env),
            hostnames(),
            CapabilityRegistry::new(),
        )
    }

    #[test]
    fn test_port_table_precedence() {
        let mut config = RedirectConfig::default();
        let env = MapEnv::new();
        assert_eq!(port_table(&config, &env, None), PortTable::Legacy);

        let base = Url::parse("http://edge:4510").unwrap();
        assert_eq!(port_table(&config, &env, Some(&base)), PortTable::Edge(4510));

        config.edge_port = Some(4566);
        assert_eq!(port_table(&config, &env, Some(&base)), PortTable::Edge(4566));

        let env = MapEnv::new().with(EDGE_PORT, "4577");
        assert_eq!(port_table(&config, &env, Some(&base)), PortTable::Edge(4577));
    }

    #[tokio::test]
    async fn test_local_endpoints_from_env() {
        let env = MapEnv::new()
            .with(USE_SSL, "1")
            .with(LOCALSTACK_HOSTNAME, "stack.internal");
        let mut config = RedirectConfig::default();
        config.endpoints.insert("SQS".into(), "http://queue:9324".into());

        let endpoints = local_endpoints(&config, &env, &hostnames()).await;
        assert_eq!(endpoints.url("s3"), Some("https://stack.internal:4572"));
        assert_eq!(endpoints.url("sqs"), Some("http://queue:9324"));
    }

    #[tokio::test]
    async fn test_configured_host_beats_env_url() {
        let env = MapEnv::new().with(AWS_ENDPOINT_URL, "http://from-env:4566");
        let mut config = RedirectConfig::default();
        config.host = Some("http://localhost".into());

        let endpoints = local_endpoints(&config, &env, &hostnames()).await;
        assert_eq!(endpoints.url("lambda"), Some("http://127.0.0.1:4574"));

        let endpoints = local_endpoints(&RedirectConfig::default(), &env, &hostnames()).await;
        assert_eq!(endpoints.url("lambda"), Some("http://from-env:4566"));
    }

    /// Collects the message of every event.
    #[derive(Clone, Default)]
    struct Messages(Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Messages {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct Message(Option<String>);

            impl tracing::field::Visit for Message {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    if field.name() == "message" {
                        self.0 = Some(format!("{value:?}"));
                    }
                }
            }

            let mut message = Message(None);
            event.record(&mut message);
            if let Some(text) = message.0 {
                self.0.lock().unwrap().push(text);
            }
        }
    }

    impl Messages {
        fn count(&self, text: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|m| m.as_str() == text).count()
        }
    }

    #[tokio::test]
    async fn test_debug_flag_reports_each_service() {
        use tracing_subscriber::layer::SubscriberExt;

        let messages = Messages::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(messages.clone()));

        let quiet = RedirectConfig::default();
        local_endpoints(&quiet, &MapEnv::new(), &hostnames()).await;
        assert_eq!(messages.count("Reconfiguring service"), 0);

        let verbose = RedirectConfig {
            debug: true,
            ..Default::default()
        };
        let endpoints = local_endpoints(&verbose, &MapEnv::new(), &hostnames()).await;
        assert_eq!(messages.count("Reconfiguring service"), endpoints.len());
    }

    #[tokio::test]
    async fn test_config_error_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.json");
        let coordinator = coordinator(
            json!({"endpointFile": path.to_str().unwrap()}),
            CliOptions::default(),
            MapEnv::new(),
        );

        let first = coordinator.ensure_activated(&OfflineTransport).await.unwrap_err();
        assert!(first.to_string().contains("late.json"));
        assert_eq!(coordinator.state(), ActivationState::Failed);

        std::fs::write(&path, r#"{"S3": "http://late:4572"}"#).unwrap();

        let second = coordinator.ensure_activated(&OfflineTransport).await.unwrap_err();
        assert_eq!(second.to_string(), first.to_string());
        assert_eq!(coordinator.state(), ActivationState::Failed);
        assert!(coordinator.failure().is_some());
        assert!(coordinator.outcome().is_none());
        assert_eq!(coordinator.sdk.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_inactive_stage_is_terminal() {
        let coordinator = coordinator(
            json!({"stages": ["production"], "endpoints": {"s3": "http://localhost:4572"}}),
            CliOptions::with_stage("staging"),
            MapEnv::new(),
        );

        let state = coordinator.ensure_activated(&OfflineTransport).await.unwrap();
        assert_eq!(state, ActivationState::Inactive);
        assert!(coordinator.outcome().unwrap().config.endpoints.is_empty());
        assert!(coordinator.side_effects().completed().is_empty());
        assert_eq!(coordinator.sdk.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_bucket_failure_keeps_latch_open() {
        let service = Arc::new({
            let mut s = ServiceDescriptor::with_plugin_config(json!({}));
            s.provider.deployment_bucket = Some("deploys".into());
            s
        });
        let coordinator = ActivationCoordinator::new(
            ConfigResolver::new(service, CliOptions::default()),
            Arc::new(SdkConfig::new()),
            Arc::new(MapEnv::new()),
            hostnames(),
            CapabilityRegistry::new(),
        );

        let err = coordinator.ensure_activated(&OfflineTransport).await.unwrap_err();
        assert!(matches!(err, InterceptError::Transport(Offline)));
        assert_eq!(coordinator.state(), ActivationState::Uninitialized);
        assert!(coordinator.side_effects().has_run(PUBLISH_ENDPOINTS));

        let _ = coordinator.ensure_activated(&OfflineTransport).await;
        assert_eq!(coordinator.sdk.publish_count(), 1);
    }
}
