//! Endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! base host + PortTable ──▶ build_uniform ──┐
//!                                           ├─▶ merge (overrides win) ──▶ EndpointMap
//! endpoints / endpointFile ──▶ overrides ───┘
//! ```
//!
//! # Design Decisions
//! - Service keys are lower-cased on insert; lookups are case-insensitive
//! - No entry means the client keeps its original endpoint
//! - Pure data transformation, no network access

pub mod ports;
pub mod table;

pub use ports::{PortTable, DEFAULT_EDGE_PORT, LEGACY_PORTS};
pub use table::{EndpointMap, EndpointTable, ServiceEndpoint};
