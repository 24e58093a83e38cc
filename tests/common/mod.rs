//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use endpoint_redirect::config::{CliOptions, MapEnv, ServiceDescriptor, ServiceView};
use endpoint_redirect::net::ConnectivityProbe;
use endpoint_redirect::{Redirector, SdkConfig, Transport};

/// Error returned by [`RecordingTransport`] when failing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportFailure(pub String);

/// One call that reached the transport.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub service: String,
    pub operation: String,
    pub params: Value,
    /// Endpoint the client config held for the service at call time.
    pub endpoint: Option<String>,
}

/// Transport that records every call and answers from canned data.
pub struct RecordingTransport {
    sdk: Arc<SdkConfig>,
    calls: Mutex<Vec<RecordedCall>>,
    buckets: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new(sdk: Arc<SdkConfig>) -> Self {
        Self {
            sdk,
            calls: Mutex::new(Vec::new()),
            buckets: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn with_bucket(self, name: &str) -> Self {
        self.buckets.lock().unwrap().push(name.to_string());
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    type Error = TransportFailure;

    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, TransportFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            service: service.to_string(),
            operation: operation.to_string(),
            params: params.clone(),
            endpoint: self.sdk.endpoint_for(service).map(|e| e.url),
        });

        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportFailure(format!("{service}.{operation}")));
        }

        match operation {
            "listBuckets" => {
                let buckets: Vec<Value> = self
                    .buckets
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|name| json!({ "Name": name }))
                    .collect();
                Ok(json!({ "Buckets": buckets }))
            }
            "createBucket" => {
                if let Some(name) = params.get("Bucket").and_then(Value::as_str) {
                    self.buckets.lock().unwrap().push(name.to_string());
                }
                Ok(json!({}))
            }
            _ => Ok(json!({ "ok": true })),
        }
    }
}

/// Probe with a fixed answer that counts its invocations.
#[derive(Default)]
pub struct FixedProbe {
    pub reachable: bool,
    pub calls: AtomicUsize,
}

impl FixedProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for FixedProbe {
    async fn reachable(&self, _host: &str, _port: u16, _timeout: Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

/// Redirector around a fresh recording transport, isolated from the process env.
pub fn redirector(
    service: Arc<dyn ServiceView>,
    cli: CliOptions,
    env: MapEnv,
) -> (Redirector<RecordingTransport>, Arc<RecordingTransport>) {
    let sdk = Arc::new(SdkConfig::new());
    let transport = Arc::new(RecordingTransport::new(sdk.clone()));
    let redirector = Redirector::builder(service, transport.clone())
        .cli(cli)
        .env(Arc::new(env))
        .probe(Arc::new(FixedProbe::new(true)))
        .sdk(sdk)
        .build();
    (redirector, transport)
}

pub fn service(block: Value) -> Arc<dyn ServiceView> {
    Arc::new(ServiceDescriptor::with_plugin_config(block))
}

/// Write `contents` to a temporary JSON file.
pub fn endpoint_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
