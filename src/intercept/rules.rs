//! Special-case rules applied to intercepted calls.
//!
//! # Rules
//! ```text
//! skip:     validateTemplate                      → "" (never forwarded)
//! rewrite:  params.TemplateURL
//!             "https://s3.amazonaws.com/b/t.json" → "{s3 endpoint}/b/t.json"
//! ```
//!
//! # Design Decisions
//! - A fixed list of explicit string rules, no templating
//! - Only the first occurrence of the default host is replaced

use serde_json::Value;

use crate::endpoints::EndpointMap;

/// Operations the local substitute does not implement.
pub const SKIPPED_OPERATIONS: &[&str] = &["validateTemplate"];

pub fn is_skipped(operation: &str) -> bool {
    SKIPPED_OPERATIONS.contains(&operation)
}

/// A URL carried in request parameters that points at a dependency service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedUrlRule {
    /// Top-level parameter holding the URL.
    pub field: &'static str,
    /// Default endpoint prefix to replace.
    pub default_prefix: &'static str,
    /// Service whose redirect target replaces the prefix.
    pub target_service: &'static str,
}

pub const EMBEDDED_URL_RULES: &[EmbeddedUrlRule] = &[EmbeddedUrlRule {
    field: "TemplateURL",
    default_prefix: "https://s3.amazonaws.com",
    target_service: "s3",
}];

impl EmbeddedUrlRule {
    /// Rewrite `params` in place. Returns true if anything changed.
    pub fn apply(&self, params: &mut Value, endpoints: &EndpointMap) -> bool {
        let Some(target) = endpoints.url(self.target_service) else {
            return false;
        };
        let Some(Value::String(url)) = params.get_mut(self.field) else {
            return false;
        };
        if !url.contains(self.default_prefix) {
            return false;
        }

        let rewritten = url.replacen(self.default_prefix, target.trim_end_matches('/'), 1);
        tracing::debug!(field = self.field, url = %rewritten, "Overriding embedded URL");
        *url = rewritten;
        true
    }
}

/// Apply every embedded-URL rule. Returns the number of rewrites.
pub fn rewrite_embedded_urls(params: &mut Value, endpoints: &EndpointMap) -> usize {
    EMBEDDED_URL_RULES
        .iter()
        .filter(|rule| rule.apply(params, endpoints))
        .count()
}
