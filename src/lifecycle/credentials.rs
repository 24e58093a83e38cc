//! Placeholder credentials for locally redirected calls.

use crate::client::{Credentials, SdkConfig};
use crate::config::env::{Environment, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY};

pub const PLACEHOLDER_ACCESS_KEY_ID: &str = "test";
pub const PLACEHOLDER_SECRET_ACCESS_KEY: &str = "test";

fn env_or_placeholder(env: &dyn Environment, key: &str, placeholder: &str) -> (String, bool) {
    match env.var(key) {
        Some(value) => (value, false),
        None => {
            env.set_var(key, placeholder);
            (placeholder.to_string(), true)
        }
    }
}

/// Make sure the client has credentials. Missing variables are filled with
/// placeholders and written back to the environment.
///
/// Returns true if any placeholder was injected.
pub fn ensure_credentials(sdk: &SdkConfig, env: &dyn Environment) -> bool {
    if sdk.credentials().is_some() {
        return false;
    }

    let (access_key_id, key_injected) =
        env_or_placeholder(env, AWS_ACCESS_KEY_ID, PLACEHOLDER_ACCESS_KEY_ID);
    let (secret_access_key, secret_injected) =
        env_or_placeholder(env, AWS_SECRET_ACCESS_KEY, PLACEHOLDER_SECRET_ACCESS_KEY);

    sdk.set_credentials(Credentials {
        access_key_id,
        secret_access_key,
    });

    let injected = key_injected || secret_injected;
    if injected {
        tracing::debug!("No credentials configured, using placeholder key pair");
    }
    injected
}
