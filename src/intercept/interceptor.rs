//! The wrapped call entrypoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::SdkConfig;
use crate::error::InterceptError;
use crate::intercept::rules::{is_skipped, rewrite_embedded_urls};
use crate::intercept::Transport;
use crate::lifecycle::ActivationCoordinator;
use crate::observability::metrics::{self, Outcome};

/// Wraps the client's original transport.
///
/// Every call first triggers activation, then either short-circuits,
/// or rewrites embedded URLs and forwards to the original transport.
pub struct RequestInterceptor<T: Transport> {
    transport: Arc<T>,
    coordinator: Arc<ActivationCoordinator>,
    sdk: Arc<SdkConfig>,
}

impl<T: Transport> Clone for RequestInterceptor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            coordinator: self.coordinator.clone(),
            sdk: self.sdk.clone(),
        }
    }
}

impl<T: Transport> RequestInterceptor<T> {
    pub fn new(
        transport: Arc<T>,
        coordinator: Arc<ActivationCoordinator>,
        sdk: Arc<SdkConfig>,
    ) -> Self {
        Self {
            transport,
            coordinator,
            sdk,
        }
    }

    /// The original, unwrapped transport.
    pub fn original(&self) -> &Arc<T> {
        &self.transport
    }

    pub async fn intercept(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, InterceptError<T::Error>> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "intercept",
            request_id = %request_id,
            service = %service,
            operation = %operation
        );

        let result = self.dispatch(service, operation, params).instrument(span).await;
        let outcome = match &result {
            Ok(Dispatched::Skipped) => Outcome::Skipped,
            Ok(Dispatched::Forwarded(_)) => Outcome::Forwarded,
            Err(_) => Outcome::Failed,
        };
        metrics::record_request(service, outcome);

        result.map(|dispatched| match dispatched {
            Dispatched::Skipped => Value::String(String::new()),
            Dispatched::Forwarded(value) => value,
        })
    }

    async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        mut params: Value,
    ) -> Result<Dispatched, InterceptError<T::Error>> {
        let activation = self.coordinator.ensure_activated(self.transport.as_ref()).await;

        if is_skipped(operation) {
            if let Err(e) = &activation {
                tracing::debug!(error = %e, "Activation failed, skipping anyway");
            }
            tracing::debug!("Operation not supported locally, returning empty result");
            return Ok(Dispatched::Skipped);
        }
        activation?;

        let endpoints = self.sdk.endpoints();
        if endpoints.contains(service) {
            let rewritten = rewrite_embedded_urls(&mut params, &endpoints);
            if rewritten > 0 {
                tracing::debug!(rewritten, "Embedded URLs redirected");
            }
        }

        self.transport
            .request(service, operation, params)
            .await
            .map(Dispatched::Forwarded)
            .map_err(InterceptError::Transport)
    }
}

enum Dispatched {
    Skipped,
    Forwarded(Value),
}

#[async_trait]
impl<T: Transport> Transport for RequestInterceptor<T> {
    type Error = InterceptError<T::Error>;

    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, Self::Error> {
        self.intercept(service, operation, params).await
    }
}
