//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! configured host (or default)
//!     → hostname.rs (strip to bare hostname)
//!     → is it "localhost"?
//!         no  → use verbatim
//!         yes → probe.rs (TCP connect, 1s timeout)
//!                 ok   → "localhost"
//!                 fail → "127.0.0.1"
//!     → cached for the rest of the run
//! ```
//!
//! # Design Decisions
//! - A probe failure is a definitive answer; no retries, no backoff
//! - The probe sits behind a trait so tests never touch the network

pub mod hostname;
pub mod probe;

pub use hostname::{bare_hostname, HostnameResolver, LOOPBACK_ADDR, LOOPBACK_NAME};
pub use probe::{ConnectivityProbe, TcpProbe};
