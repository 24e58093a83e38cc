//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Triggers (any number, any order):
//!     host hook (before deploy) ─┐
//!     first intercepted call ────┴─▶ activation.rs (single in-flight latch)
//!
//! Activation (once):
//!     resolve config → decide stage → autostart (launcher.rs)
//!     → credentials.rs → publish endpoints → install overrides
//!     → bucket.rs (deployment bucket)
//! ```
//!
//! # Design Decisions
//! - Irreversible effects wait until configuration is fully resolved
//! - Each effect is named and recorded (side_effects.rs); none repeats
//! - Terminal states are never left within a process run

pub mod activation;
pub mod bucket;
pub mod credentials;
pub mod launcher;
pub mod side_effects;

pub use activation::{local_endpoints, Activation, ActivationCoordinator, ActivationState};
pub use launcher::Launcher;
pub use side_effects::SideEffects;
