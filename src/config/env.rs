//! Environment variable access.
//!
//! Everything the redirector reads from (or writes to) the process
//! environment goes through [`Environment`], so resolution stays a pure
//! function of its inputs under test.

use std::collections::HashMap;
use std::sync::Mutex;

pub const AWS_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const LOCALSTACK_HOSTNAME: &str = "LOCALSTACK_HOSTNAME";
pub const USE_SSL: &str = "USE_SSL";
pub const EDGE_PORT: &str = "EDGE_PORT";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const LAMBDA_MOUNT_CWD: &str = "LAMBDA_MOUNT_CWD";

/// Source of environment variables.
pub trait Environment: Send + Sync + std::fmt::Debug {
    /// Returns the value of `key`, treating empty values as unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Sets `key` for the rest of the process run.
    fn set_var(&self, key: &str, value: &str);

    /// Returns true if `key` holds a truthy flag ("1", "true", "yes").
    fn flag(&self, key: &str) -> bool {
        self.var(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn set_var(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// In-memory environment, isolated from the process.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: &str, value: &str) -> Self {
        self.set_var(key, value);
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        let vars = self.vars.lock().unwrap_or_else(|e| e.into_inner());
        vars.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        let mut vars = self.vars.lock().unwrap_or_else(|e| e.into_inner());
        vars.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_flags() {
        let env = MapEnv::new().with(USE_SSL, "TRUE").with(EDGE_PORT, "");
        assert!(env.flag(USE_SSL));
        assert!(!env.flag("MISSING"));
        assert_eq!(env.var(EDGE_PORT), None);
    }
}
