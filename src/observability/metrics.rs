//! Metrics collection.
//!
//! # Metrics
//! - `redirect_requests_total` (counter): intercepted calls by service, outcome
//! - `redirect_activations_total` (counter): terminal activations by state

use crate::lifecycle::ActivationState;

pub const REQUESTS_TOTAL: &str = "redirect_requests_total";
pub const ACTIVATIONS_TOTAL: &str = "redirect_activations_total";

/// What happened to an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    Skipped,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Forwarded => "forwarded",
            Outcome::Skipped => "skipped",
            Outcome::Failed => "failed",
        }
    }
}

pub fn record_request(service: &str, outcome: Outcome) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "service" => service.to_ascii_lowercase(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_activation(state: ActivationState) {
    metrics::counter!(ACTIVATIONS_TOTAL, "state" => state.as_str()).increment(1);
}
