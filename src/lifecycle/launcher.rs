//! Hook for starting the local service before activation.
//!
//! Starting and supervising the service process is the host's business;
//! the redirector only asks it to make sure the service is up.

use async_trait::async_trait;

use crate::config::RedirectConfig;
use crate::hooks::HookError;

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start the local service unless it is already running.
    async fn ensure_running(&self, config: &RedirectConfig) -> Result<(), HookError>;
}
