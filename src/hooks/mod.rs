//! Capability override subsystem.
//!
//! # Data Flow
//! ```text
//! host capability (original fn)
//!     → registry.wrap(name, original)        at host startup
//!     → mount_code::install(registry, ...)   once, during activation
//!     → wrapped(args) → override(original, args) | original(args)
//! ```
//!
//! # Design Decisions
//! - Overrides go through an explicit registry; nothing reaches into another
//!   component's internals
//! - First registration for a name wins, so repeated installs are harmless

pub mod mount_code;
pub mod registry;

pub use registry::{capability, Capability, CapabilityRegistry, HookError};
