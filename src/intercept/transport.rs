//! The call surface being intercepted.

use async_trait::async_trait;
use serde_json::Value;

/// The client's original outbound call entrypoint.
///
/// Implementations read their endpoints from the shared
/// [`SdkConfig`](crate::client::SdkConfig) at call time.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, Self::Error>;
}
