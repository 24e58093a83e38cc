//! Configuration layering, effective stage and the activation rule.
//!
//! # Responsibilities
//! - Overlay CLI options on the `custom.localstack` block (CLI wins)
//! - Merge the endpoint file into the inline `endpoints` (file wins)
//! - Derive the effective stage: CLI > custom > provider > default
//! - Decide whether redirection applies to this run
//!
//! # Design Decisions
//! - Nothing is cached; every call re-reads the service view, because the
//!   host may still be interpolating its descriptor
//! - A stage candidate that still holds `${...}` counts as not given

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::has_placeholder;
use crate::config::loader::ConfigError;
use crate::config::schema::{RedirectConfig, DEFAULT_STAGE};
use crate::config::service::ServiceView;
use crate::config::validation::validate_config;
use crate::endpoints::EndpointTable;

/// Options passed on the host's command line.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    /// `--stage`.
    pub stage: Option<String>,
    /// Any other option, overlaid on the plugin block by key.
    pub extra: Map<String, Value>,
}

impl CliOptions {
    pub fn with_stage(stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            ..Default::default()
        }
    }

    /// Builder-style option.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Configuration is complete.
    Ready(RedirectConfig),
    /// The endpoint file path is still a template; try again later.
    Deferred { endpoint_file: String },
}

/// Activation rule.
///
/// Without a `stages` list only the default stage activates; once a list is
/// configured, only membership does.
pub fn is_active(stage: &str, stages: Option<&[String]>) -> bool {
    match stages {
        None => stage == DEFAULT_STAGE,
        Some(stages) => stages.iter().any(|s| s == stage),
    }
}

/// Overlay `overlay` on `base` key by key. A non-object base is discarded.
pub fn merge_layers(base: Option<Value>, overlay: &Map<String, Value>) -> Value {
    let mut merged = match base {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

fn resolved(candidate: Option<String>) -> Option<String> {
    candidate.filter(|s| !s.trim().is_empty() && !has_placeholder(s))
}

/// Merges configuration layers for one service.
pub struct ConfigResolver {
    service: Arc<dyn ServiceView>,
    cli: CliOptions,
}

impl ConfigResolver {
    pub fn new(service: Arc<dyn ServiceView>, cli: CliOptions) -> Self {
        Self { service, cli }
    }

    pub fn cli(&self) -> &CliOptions {
        &self.cli
    }

    pub fn service(&self) -> &Arc<dyn ServiceView> {
        &self.service
    }

    /// Stage this run deploys to, as of the current service view.
    pub fn effective_stage(&self) -> String {
        let cli = resolved(self.cli.stage.clone());
        let custom = resolved(self.service.custom_stage());
        let provider = resolved(self.service.provider_stage());

        tracing::debug!(
            cli = ?cli,
            custom = ?custom,
            provider = ?provider,
            "Deriving effective stage"
        );

        cli.or(custom)
            .or(provider)
            .unwrap_or_else(|| DEFAULT_STAGE.to_string())
    }

    /// Whether `config` (as returned by [`resolve`](Self::resolve)) activates redirection.
    pub fn is_active(&self, config: &RedirectConfig) -> bool {
        is_active(&config.stage, config.stages.as_deref())
    }

    /// Merge all layers into the effective configuration.
    pub async fn resolve(&self) -> Result<Resolution, ConfigError> {
        let merged = merge_layers(self.service.plugin_config(), &self.cli.extra);
        let mut config: RedirectConfig =
            serde_json::from_value(merged).map_err(ConfigError::Layer)?;
        config.stage = self.effective_stage();

        if let Some(path) = config.endpoint_file.clone() {
            if has_placeholder(&path) {
                tracing::debug!(path = %path, "Endpoint file path not rendered yet, deferring");
                return Ok(Resolution::Deferred {
                    endpoint_file: path,
                });
            }

            let from_disk = EndpointTable::load(&path).await?;
            for (service, endpoint) in from_disk.iter() {
                tracing::debug!(service = %service, "Intercepting service");
                config
                    .endpoints
                    .retain(|existing, _| !existing.eq_ignore_ascii_case(service));
                config
                    .endpoints
                    .insert(service.clone(), endpoint.url.clone());
            }
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Resolution::Ready(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::service::ServiceDescriptor;
    use serde_json::json;
    use std::io::Write;

    fn resolver(block: Value, cli: CliOptions) -> ConfigResolver {
        let service = ServiceDescriptor::with_plugin_config(block);
        ConfigResolver::new(Arc::new(service), cli)
    }

    async fn ready(resolver: &ConfigResolver) -> RedirectConfig {
        match resolver.resolve().await.unwrap() {
            Resolution::Ready(config) => config,
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[test]
    fn test_activation_rule() {
        assert!(is_active("dev", None));
        assert!(!is_active("prod", None));

        let stages = vec!["production".to_string(), "staging".to_string()];
        assert!(is_active("staging", Some(stages.as_slice())));
        assert!(!is_active("dev", Some(stages.as_slice())));
        assert!(!is_active("dev", Some(&[][..])));
    }

    #[test]
    fn test_stage_precedence() {
        let mut service = ServiceDescriptor::default();
        service.provider.stage = Some("provider".into());
        let service = Arc::new(service);

        let r = ConfigResolver::new(service.clone(), CliOptions::default());
        assert_eq!(r.effective_stage(), "provider");

        let mut with_custom = (*service).clone();
        with_custom.custom.stage = Some("custom".into());
        let r = ConfigResolver::new(Arc::new(with_custom.clone()), CliOptions::default());
        assert_eq!(r.effective_stage(), "custom");

        let r = ConfigResolver::new(Arc::new(with_custom), CliOptions::with_stage("cli"));
        assert_eq!(r.effective_stage(), "cli");

        let r = ConfigResolver::new(Arc::new(ServiceDescriptor::default()), CliOptions::default());
        assert_eq!(r.effective_stage(), DEFAULT_STAGE);
    }

    #[test]
    fn test_unrendered_stage_is_skipped() {
        let mut service = ServiceDescriptor::default();
        service.custom.stage = Some("${opt:stage, 'dev'}".into());
        service.provider.stage = Some("qa".into());
        let r = ConfigResolver::new(Arc::new(service), CliOptions::default());
        assert_eq!(r.effective_stage(), "qa");
    }

    #[tokio::test]
    async fn test_empty_config_is_inactive_baseline() {
        let r = ConfigResolver::new(Arc::new(ServiceDescriptor::default()), CliOptions::default());
        let config = ready(&r).await;
        assert!(config.endpoints.is_empty());
        assert!(config.endpoint_file.is_none());
        assert_eq!(config.stage, DEFAULT_STAGE);
    }

    #[tokio::test]
    async fn test_cli_overrides_block() {
        let cli = CliOptions::with_stage("production").option("debug", json!(true));
        let r = resolver(json!({"debug": false, "stages": ["production", "staging"]}), cli);
        let config = ready(&r).await;

        assert!(config.debug);
        assert_eq!(config.stage, "production");
        assert_eq!(
            config.stages,
            Some(vec!["production".to_string(), "staging".to_string()])
        );
        assert!(r.is_active(&config));
    }

    #[tokio::test]
    async fn test_stage_outside_list_is_inactive() {
        let r = resolver(json!({"stages": ["production"]}), CliOptions::with_stage("staging"));
        let config = ready(&r).await;
        assert!(!r.is_active(&config));
    }

    #[tokio::test]
    async fn test_endpoint_file_wins_over_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"s3": "http://files:4572", "Lambda": "http://files:4574"}}"#
        )
        .unwrap();

        let r = resolver(
            json!({
                "endpoints": {"S3": "http://inline:4572", "SQS": "http://inline:4576"},
                "endpointFile": file.path().to_str().unwrap(),
            }),
            CliOptions::default(),
        );
        let config = ready(&r).await;

        assert_eq!(config.endpoints.get("s3").map(String::as_str), Some("http://files:4572"));
        assert!(!config.endpoints.contains_key("S3"));
        assert_eq!(config.endpoints.get("SQS").map(String::as_str), Some("http://inline:4576"));
        assert_eq!(config.endpoints.get("lambda").map(String::as_str), Some("http://files:4574"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_file_fails() {
        let r = resolver(
            json!({"endpointFile": "missing.json", "stages": ["production"]}),
            CliOptions::with_stage("production"),
        );
        let err = r.resolve().await.unwrap_err();
        assert_eq!(err.path(), Some("missing.json"));
        assert!(err
            .to_string()
            .starts_with("Endpoint file \"missing.json\" is invalid:"));
    }

    #[tokio::test]
    async fn test_templated_endpoint_file_defers() {
        let r = resolver(
            json!({"endpointFile": "${self:custom.endpointsPath}"}),
            CliOptions::default(),
        );
        let resolution = r.resolve().await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Deferred {
                endpoint_file: "${self:custom.endpointsPath}".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_endpoint_url_is_rejected() {
        let r = resolver(json!({"endpoints": {"s3": "not a url"}}), CliOptions::default());
        let err = r.resolve().await.unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}
