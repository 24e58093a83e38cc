//! Named one-shot side effects.

use std::future::Future;

use dashmap::DashSet;

pub const AUTOSTART: &str = "autostart";
pub const CONFIGURE_CREDENTIALS: &str = "configure-credentials";
pub const PUBLISH_ENDPOINTS: &str = "publish-endpoints";
pub const INSTALL_OVERRIDES: &str = "install-overrides";
pub const DEPLOYMENT_BUCKET: &str = "deployment-bucket";

/// Tracks which side effects already completed.
///
/// An effect is recorded only after it succeeds, so a failed effect runs
/// again on the next activation attempt. Callers must not run the same
/// effect concurrently; the activation latch guarantees that.
#[derive(Debug, Default)]
pub struct SideEffects {
    done: DashSet<&'static str>,
}

impl SideEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_run(&self, name: &str) -> bool {
        self.done.contains(name)
    }

    /// Completed effects, sorted by name.
    pub fn completed(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.done.iter().map(|n| *n).collect();
        names.sort_unstable();
        names
    }

    /// Run `effect` unless `name` already completed. Returns true if it ran.
    pub fn run_once<E>(
        &self,
        name: &'static str,
        effect: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.done.contains(name) {
            tracing::debug!(effect = name, "Side effect already applied");
            return Ok(false);
        }
        effect()?;
        self.done.insert(name);
        Ok(true)
    }

    /// Async variant of [`run_once`](Self::run_once).
    pub async fn run_once_async<E, Fut>(
        &self,
        name: &'static str,
        effect: impl FnOnce() -> Fut,
    ) -> Result<bool, E>
    where
        Fut: Future<Output = Result<(), E>>,
    {
        if self.done.contains(name) {
            tracing::debug!(effect = name, "Side effect already applied");
            return Ok(false);
        }
        effect().await?;
        self.done.insert(name);
        Ok(true)
    }
}
