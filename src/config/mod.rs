//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! service descriptor (TOML) ──▶ loader.rs ──▶ ServiceDescriptor
//!                                                │ (swapped by the host as
//!                                                │  templates get rendered)
//!                                                ▼
//! custom.localstack block ─┐
//! CLI options ─────────────┴─▶ resolver.rs (merge layers, CLI wins)
//!     → endpoint file (endpoints::table::load)
//!     → validation.rs (semantic checks)
//!     → Resolution::Ready(RedirectConfig) | Resolution::Deferred
//! ```
//!
//! # Design Decisions
//! - Resolution is a pure function of the current inputs; it can be re-run
//!   any number of times until the host has finished interpolation
//! - All fields have defaults so an absent block is an inactive baseline
//! - An endpoint file path holding `${...}` defers instead of failing

pub mod env;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod validation;

pub use env::{Environment, MapEnv, ProcessEnv};
pub use loader::{load_service_file, ConfigError, EndpointFileError};
pub use resolver::{is_active, CliOptions, ConfigResolver, Resolution};
pub use schema::{RedirectConfig, DEFAULT_STAGE};
pub use service::{ServiceDescriptor, ServiceView, SharedService};

/// Returns true if `value` still holds a `${...}` template placeholder.
pub fn has_placeholder(value: &str) -> bool {
    value
        .find("${")
        .map(|start| value[start + 2..].contains('}'))
        .unwrap_or(false)
}
