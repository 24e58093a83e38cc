//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! activation + interception produce:
//!     → logging.rs (structured log events, per-call span with request_id)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Every intercepted call gets a UUID v4 request id on its span
//! - Metric updates are no-ops until the host installs a recorder

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogHandle};
