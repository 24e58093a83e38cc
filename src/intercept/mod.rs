//! Request interception subsystem.
//!
//! # Data Flow
//! ```text
//! (service, operation, params)
//!     → interceptor.rs
//!         → trigger activation (no-op once terminal)
//!         → rules.rs: skipped operation?  → "" (never forwarded)
//!         → rules.rs: rewrite embedded URLs (redirected services only)
//!         → transport.rs: original entrypoint
//!     ← result or the transport's own error, untouched
//! ```
//!
//! # Design Decisions
//! - The interceptor is itself a [`Transport`], so it drops in where the original was
//! - Endpoints are read from the shared client config at call time

pub mod interceptor;
pub mod rules;
pub mod transport;

pub use crate::error::InterceptError;
pub use interceptor::RequestInterceptor;
pub use transport::Transport;
