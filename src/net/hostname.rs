//! Loopback hostname resolution.
//!
//! `localhost` may resolve to the IPv6 loopback on some systems while the
//! local service only listens on IPv4. When the configured host is
//! `localhost`, a short TCP probe decides between keeping the name and
//! falling back to `127.0.0.1`. Any other host is used verbatim.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use url::Url;

use crate::net::probe::{ConnectivityProbe, TcpProbe};

pub const LOOPBACK_NAME: &str = "localhost";
pub const LOOPBACK_ADDR: &str = "127.0.0.1";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Reduce `host` to a bare hostname (drops scheme, port and path).
pub fn bare_hostname(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        if let Ok(url) = Url::parse(host) {
            if let Some(name) = url.host_str() {
                return name.trim_matches(|c| c == '[' || c == ']').to_string();
            }
        }
    }
    let without_path = host.split('/').next().unwrap_or(host);
    match without_path.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) && !name.contains(':') => {
            name.to_string()
        }
        _ => without_path.to_string(),
    }
}

/// Resolves the loopback hostname once and caches the answer.
pub struct HostnameResolver {
    probe: Arc<dyn ConnectivityProbe>,
    timeout: Duration,
    cached: OnceCell<String>,
}

impl HostnameResolver {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            probe,
            timeout: PROBE_TIMEOUT,
            cached: OnceCell::new(),
        }
    }

    /// Override the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The resolved hostname, if resolution already ran.
    pub fn cached(&self) -> Option<&str> {
        self.cached.get().map(String::as_str)
    }

    /// Hostname to use for `configured` (or `default_host` when unset).
    ///
    /// The first answer is kept for the lifetime of the resolver.
    pub async fn resolve(&self, configured: Option<&str>, default_host: &str, port: u16) -> String {
        self.cached
            .get_or_init(|| async {
                let host = bare_hostname(configured.unwrap_or(default_host));
                if host != LOOPBACK_NAME {
                    return host;
                }

                if self.probe.reachable(LOOPBACK_NAME, port, self.timeout).await {
                    tracing::debug!(port, "Loopback name reachable, keeping it");
                    LOOPBACK_NAME.to_string()
                } else {
                    tracing::warn!(
                        port,
                        fallback = LOOPBACK_ADDR,
                        "Loopback name unreachable, using numeric address"
                    );
                    LOOPBACK_ADDR.to_string()
                }
            })
            .await
            .clone()
    }
}

impl Default for HostnameResolver {
    fn default() -> Self {
        Self::new(Arc::new(TcpProbe))
    }
}
