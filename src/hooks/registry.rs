//! Registry of named capability overrides.
//!
//! The host wraps each capability it exposes once, up front:
//!
//! ```text
//! let compile = registry.wrap("AwsCompileFunctions.compileFunction", original);
//! ```
//!
//! The wrapped capability looks the override up on every call, so overrides
//! registered later (during activation) still take effect.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("capability {name} failed: {message}")]
    Capability { name: String, message: String },

    #[error("launcher failed: {0}")]
    Launcher(String),

    #[error("cannot determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

pub type CapabilityFuture = BoxFuture<'static, Result<Value, HookError>>;

/// A host capability: JSON arguments in, JSON result out.
pub type Capability = Arc<dyn Fn(Value) -> CapabilityFuture + Send + Sync>;

/// Replacement for a capability; receives the original and the arguments.
pub type Override = Arc<dyn Fn(Capability, Value) -> CapabilityFuture + Send + Sync>;

/// Build a [`Capability`] from an async closure.
pub fn capability<F, Fut>(f: F) -> Capability
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HookError>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    overrides: Arc<DashMap<String, Override>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override for `name`. The first registration wins;
    /// returns false if one was already present.
    pub fn register<F, Fut>(&self, name: &str, f: F) -> bool
    where
        F: Fn(Capability, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HookError>> + Send + 'static,
    {
        match self.overrides.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let hook: Override = Arc::new(move |original, args| f(original, args).boxed());
                slot.insert(hook);
                tracing::debug!(capability = %name, "Override registered");
                true
            }
        }
    }

    /// Wrap `original` so calls go through the override for `name`, if any.
    pub fn wrap(&self, name: &str, original: Capability) -> Capability {
        let overrides = self.overrides.clone();
        let name = name.to_string();
        Arc::new(move |args| {
            let hook = overrides.get(&name).map(|entry| entry.value().clone());
            match hook {
                Some(hook) => hook(original.clone(), args),
                None => original(args),
            }
        })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Names with an override, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.overrides.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("overrides", &self.names())
            .finish()
    }
}
