//! Local endpoint redirection library.
//!
//! Redirects a cloud client's outbound calls to locally hosted substitutes
//! for a configurable set of deployment stages.

// Core subsystems
pub mod config;
pub mod endpoints;
pub mod intercept;
pub mod net;

// Host integration
pub mod client;
pub mod hooks;
pub mod lifecycle;
pub mod redirector;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use client::SdkConfig;
pub use config::{ConfigError, RedirectConfig};
pub use error::InterceptError;
pub use intercept::{RequestInterceptor, Transport};
pub use lifecycle::{ActivationCoordinator, ActivationState};
pub use redirector::{Redirector, RedirectorBuilder};
