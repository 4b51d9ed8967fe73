//! Shared utilities for integration tests.

use chrono::{TimeZone, Utc};
use request_diagnostics::config::{ReplicaConfig, SimulationConfig};
use request_diagnostics::diagnostics::{OperationType, RequestDiagnostics, ResourceType, StoreResult, Timestamp};

/// Timestamp `ms` milliseconds after the epoch.
pub fn at(ms: i64) -> Timestamp {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Record a successful primary document read.
#[allow(dead_code)]
pub fn record_read(diagnostics: &RequestDiagnostics, endpoint: &str, ms: i64) {
    diagnostics.record_response(
        endpoint,
        ResourceType::Document,
        OperationType::Read,
        StoreResult::success(200),
        false,
        at(ms),
    );
}

/// Record a supplemental head-feed call.
#[allow(dead_code)]
pub fn record_head_feed(diagnostics: &RequestDiagnostics, endpoint: &str, ms: i64) {
    diagnostics.record_response(
        endpoint,
        ResourceType::Container,
        OperationType::HeadFeed,
        StoreResult::success(304).with_lsn(ms),
        true,
        at(ms),
    );
}

/// A simulated replica answering `status_code` after `latency_ms`.
#[allow(dead_code)]
pub fn replica(endpoint: &str, latency_ms: u64, status_code: u16) -> ReplicaConfig {
    ReplicaConfig {
        endpoint: endpoint.to_string(),
        latency_ms,
        status_code,
        error: None,
        resolution_error: None,
    }
}

/// Simulation with fast replicas and slow address resolution.
#[allow(dead_code)]
pub fn slow_resolution_config(replicas: Vec<ReplicaConfig>) -> SimulationConfig {
    SimulationConfig {
        replicas,
        resolution_delay_ms: 500,
        metadata_calls: 0,
    }
}
