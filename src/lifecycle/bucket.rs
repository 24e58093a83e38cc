//! Deployment bucket bootstrap.

use serde_json::{json, Value};

use crate::intercept::Transport;

/// Create `bucket` through `transport` unless it already exists.
/// Returns true if the bucket was created.
pub async fn ensure_deployment_bucket<T>(transport: &T, bucket: &str) -> Result<bool, T::Error>
where
    T: Transport + ?Sized,
{
    let listing = transport.request("S3", "listBuckets", json!({})).await?;
    let exists = listing
        .get("Buckets")
        .and_then(Value::as_array)
        .map(|buckets| {
            buckets
                .iter()
                .any(|b| b.get("Name").and_then(Value::as_str) == Some(bucket))
        })
        .unwrap_or(false);

    if exists {
        tracing::debug!(bucket = %bucket, "Deployment bucket already exists");
        return Ok(false);
    }

    tracing::info!(bucket = %bucket, "Creating deployment bucket");
    transport
        .request("S3", "createBucket", json!({ "Bucket": bucket }))
        .await?;
    Ok(true)
}
