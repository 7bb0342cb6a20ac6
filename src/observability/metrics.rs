//! Invocation and registry metrics.
//!
//! # Metrics
//! - `bridge_invocations_total` (counter): invocations by component, kind, outcome
//! - `bridge_invocation_duration_seconds` (histogram): end-to-end latency
//! - `bridge_components_total` (gauge): registered components by kind
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the embedding application installs
//!   an exporter if it wants one
//! - Outcome labels are coarse (status class or error kind) to keep
//!   cardinality bounded

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

use crate::error::{BridgeError, BridgeResult};
use crate::http::InvocationResult;
use crate::routing::ComponentType;

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "bridge_invocations_total",
        "Component invocations by component, kind and outcome"
    );
    describe_histogram!(
        "bridge_invocation_duration_seconds",
        "Invocation latency including the upstream round trip"
    );
    describe_gauge!("bridge_components_total", "Registered components by kind");
}

pub fn record_invocation(component: &str, kind: ComponentType, outcome: &'static str, elapsed: Duration) {
    let labels = [
        ("component", component.to_string()),
        ("kind", kind.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("bridge_invocations_total", &labels).increment(1);
    histogram!("bridge_invocation_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

pub fn record_components(kind: ComponentType, count: usize) {
    gauge!("bridge_components_total", "kind" => kind.to_string()).set(count as f64);
}

/// Coarse label for an invocation result.
pub fn outcome_label(result: &BridgeResult<InvocationResult>) -> &'static str {
    match result {
        Ok(r) => status_category(r.status),
        Err(BridgeError::MissingRequiredParameter { .. }) => "missing_parameter",
        Err(BridgeError::InvalidArgument { .. }) => "invalid_argument",
        Err(BridgeError::UpstreamRequest { .. }) => "upstream_error",
        Err(BridgeError::Cancelled) => "cancelled",
        Err(_) => "error",
    }
}

/// HTTP status class.
pub fn status_category(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
