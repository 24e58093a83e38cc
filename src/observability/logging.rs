//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Map the `debug` option to a default filter, also after startup
//!
//! `RUST_LOG` always takes precedence over the defaults below.

use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "endpoint_redirect=info";
pub const DEBUG_FILTER: &str = "endpoint_redirect=debug";

pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Switches the default filter once the configuration is known.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Apply the `debug` option. No-op when `RUST_LOG` set the filter.
    pub fn set_debug(&self, debug: bool) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.filter.reload(EnvFilter::new(default_filter(debug))) {
            tracing::warn!(error = %e, "Failed to update log filter");
        }
    }
}

/// Install the global subscriber. A second installation is ignored, but the
/// returned handle still works on its own (unused) filter.
pub fn init_logging(debug: bool) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_filter(debug)), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    LogHandle {
        filter: handle,
        from_env,
    }
}
