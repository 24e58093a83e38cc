//! Overrides installed when `lambda.mountCode` is on.
//!
//! Lambda code is mounted from the working directory instead of being
//! packaged and uploaded, so packaging and upload capabilities are skipped
//! and compiled functions are pointed at the local mount.

use serde_json::{json, Map, Value};

use crate::config::env::{Environment, LAMBDA_MOUNT_CWD};
use crate::config::RedirectConfig;
use crate::hooks::registry::{CapabilityRegistry, HookError};

pub const PACKAGE_SERVICE: &str = "Package.packageService";
pub const EXTENDED_VALIDATE: &str = "AwsDeploy.extendedValidate";
pub const UPLOAD_FUNCTIONS: &str = "AwsDeploy.uploadFunctionsAndLayers";
pub const COMPILE_FUNCTION: &str = "AwsCompileFunctions.compileFunction";

pub const SKIPPED_WHEN_MOUNTED: &[&str] = &[PACKAGE_SERVICE, EXTENDED_VALIDATE, UPLOAD_FUNCTIONS];

/// Bucket name the local lambda runtime reads as "mount from disk".
pub const LOCAL_BUCKET: &str = "__local__";
const LAMBDA_FUNCTION_TYPE: &str = "AWS::Lambda::Function";

/// Directory mounted into lambda containers.
pub fn mount_dir(env: &dyn Environment) -> Result<String, HookError> {
    if let Some(dir) = env.var(LAMBDA_MOUNT_CWD) {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().map_err(HookError::WorkingDir)?;
    Ok(cwd.display().to_string())
}

/// Point every lambda function in a compiled template at `mount_dir`.
/// Returns the number of functions rewritten.
pub fn rewrite_lambda_code(template: &mut Value, mount_dir: &str) -> usize {
    let Some(resources) = template.get_mut("Resources").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut rewritten = 0;
    for resource in resources.values_mut() {
        if resource.get("Type").and_then(Value::as_str) != Some(LAMBDA_FUNCTION_TYPE) {
            continue;
        }
        let Some(resource) = resource.as_object_mut() else {
            continue;
        };

        let Some(code) =
            object_entry(resource, "Properties").and_then(|props| object_entry(props, "Code"))
        else {
            continue;
        };
        code.insert("S3Bucket".to_string(), json!(LOCAL_BUCKET));
        code.insert("S3Key".to_string(), json!(mount_dir));
        rewritten += 1;
    }
    rewritten
}

/// The object under `key`, replacing a missing or non-object value with `{}`.
fn object_entry<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let slot = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
}

/// Register the mount-code overrides. Returns how many were newly installed.
pub fn install(
    registry: &CapabilityRegistry,
    config: &RedirectConfig,
    env: &dyn Environment,
) -> Result<usize, HookError> {
    if !config.should_mount_code() {
        tracing::debug!("lambda.mountCode disabled, no overrides installed");
        return Ok(0);
    }

    let dir = mount_dir(env)?;
    let mut installed = 0;

    for name in SKIPPED_WHEN_MOUNTED {
        let fqn = name.to_string();
        let added = registry.register(name, move |_original, _args| {
            let fqn = fqn.clone();
            async move {
                tracing::info!(capability = %fqn, "Skip plugin function (lambda.mountCode flag is enabled)");
                Ok(Value::Null)
            }
        });
        installed += usize::from(added);
    }

    let added = registry.register(COMPILE_FUNCTION, move |original, args| {
        let dir = dir.clone();
        async move {
            let mut template = original(args).await?;
            let count = rewrite_lambda_code(&mut template, &dir);
            tracing::debug!(functions = count, mount_dir = %dir, "Lambda code mounted from disk");
            Ok::<_, HookError>(template)
        }
    });
    installed += usize::from(added);

    Ok(installed)
}
