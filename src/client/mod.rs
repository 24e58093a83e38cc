//! Downstream client state shared with the host.

pub mod sdk_config;

pub use sdk_config::{Credentials, SdkConfig};
