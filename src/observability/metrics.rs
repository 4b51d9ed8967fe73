//! Diagnostics metrics.
//!
//! # Metrics
//! - `diagnostics_responses_total` (counter): recorded backend calls by kind, outcome
//! - `diagnostics_address_resolutions_started_total` (counter)
//! - `diagnostics_address_resolutions_completed_total` (counter): by outcome
//! - `diagnostics_protocol_violations_total` (counter): unmatched resolution ends
//! - `diagnostics_supplemental_omitted_total` (counter): entries cut from final reports
//! - `diagnostics_request_latency_seconds` (histogram): latency when the request completes

use metrics::{counter, histogram};
use std::time::Duration;

pub fn record_response(supplemental: bool, failed: bool) {
    let kind = if supplemental { "supplemental" } else { "primary" };
    let outcome = if failed { "failed" } else { "ok" };
    counter!("diagnostics_responses_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_resolution_started() {
    counter!("diagnostics_address_resolutions_started_total").increment(1);
}

pub fn record_resolution_completed(failed: bool) {
    let outcome = if failed { "failed" } else { "resolved" };
    counter!("diagnostics_address_resolutions_completed_total", "outcome" => outcome).increment(1);
}

pub fn record_protocol_violation() {
    counter!("diagnostics_protocol_violations_total").increment(1);
}

pub fn record_supplemental_omitted(count: usize) {
    counter!("diagnostics_supplemental_omitted_total").increment(count as u64);
}

pub fn record_request_latency(latency: Duration) {
    histogram!("diagnostics_request_latency_seconds").record(latency.as_secs_f64());
}
