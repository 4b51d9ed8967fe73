//! Per-request diagnostics aggregate.
//!
//! # Responsibilities
//! - Record every backend call of one logical request
//! - Bracket address resolutions with start/end calls
//! - Track the running request end time and contacted regions
//! - Hand out consistent snapshots for report generation
//!
//! # Design Decisions
//! - One mutex guards the whole aggregate; every critical section is a
//!   field update or a collection insert
//! - No `.await` anywhere: callers may hold the aggregate across tasks
//!   but each operation returns immediately
//! - Timestamps are passed in, never sampled here

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::diagnostics::tracker::AddressResolutionTracker;
use crate::diagnostics::types::{
    AddressResolutionStatistic, DiagnosticsError, DiagnosticsResult, OperationType,
    ResolutionId, ResourceType, ResponseStatistic, StoreResult, Timestamp, NULL_ENDPOINT,
};
use crate::observability::metrics;
use crate::report::{DiagnosticsReport, ReportFormatter};

/// Immutable copy of a request's diagnostics at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub activity_id: Uuid,
    pub request_start_time: Timestamp,
    pub request_end_time: Timestamp,
    pub response_statistics: Vec<ResponseStatistic>,
    pub supplemental_response_statistics: Vec<ResponseStatistic>,
    /// Resolution records in the order they were started.
    pub address_resolution_statistics: Vec<AddressResolutionStatistic>,
    pub contacted_regions: Vec<String>,
    pub contacted_replicas: Vec<String>,
    pub failed_replicas: Vec<String>,
}

impl DiagnosticsSnapshot {
    /// An empty snapshot starting and ending at `start`.
    pub fn empty(activity_id: Uuid, start: Timestamp) -> Self {
        Self {
            activity_id,
            request_start_time: start,
            request_end_time: start,
            response_statistics: Vec::new(),
            supplemental_response_statistics: Vec::new(),
            address_resolution_statistics: Vec::new(),
            contacted_regions: Vec::new(),
            contacted_replicas: Vec::new(),
            failed_replicas: Vec::new(),
        }
    }

    /// `request_end_time - request_start_time`.
    pub fn elapsed(&self) -> Duration {
        (self.request_end_time - self.request_start_time)
            .to_std()
            .unwrap_or_default()
    }

    /// Number of resolutions not yet closed.
    pub fn pending_resolutions(&self) -> usize {
        self.address_resolution_statistics
            .iter()
            .filter(|s| s.inflight_request)
            .count()
    }
}

/// Diagnostics shared by every sub-operation of one logical request.
///
/// Wrap it in an `Arc` and hand clones to each concurrent backend call.
#[derive(Debug)]
pub struct RequestDiagnostics {
    activity_id: Uuid,
    state: Mutex<DiagnosticsState>,
    completed: AtomicBool,
}

#[derive(Debug)]
struct DiagnosticsState {
    request_start_time: Timestamp,
    request_end_time: Timestamp,
    response_statistics: Vec<ResponseStatistic>,
    supplemental_response_statistics: Vec<ResponseStatistic>,
    address_resolutions: Vec<AddressResolutionStatistic>,
    resolution_index: HashMap<ResolutionId, usize>,
    contacted_regions: OrderedSet,
    contacted_replicas: OrderedSet,
    failed_replicas: OrderedSet,
    tracker: AddressResolutionTracker,
}

impl DiagnosticsState {
    fn observe(&mut self, now: Timestamp) {
        if now > self.request_end_time {
            self.request_end_time = now;
        }
    }
}

/// Insertion-ordered set of strings.
#[derive(Debug, Default)]
struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: &str) -> bool {
        if value.is_empty() || self.seen.contains(value) {
            return false;
        }
        self.seen.insert(value.to_string());
        self.items.push(value.to_string());
        true
    }
}

impl RequestDiagnostics {
    /// Start tracking a request that began at `start_time`.
    pub fn new(start_time: Timestamp) -> Self {
        Self::with_activity_id(Uuid::new_v4(), start_time)
    }

    /// Start tracking under a caller-chosen activity id.
    pub fn with_activity_id(activity_id: Uuid, start_time: Timestamp) -> Self {
        Self {
            activity_id,
            state: Mutex::new(DiagnosticsState {
                request_start_time: start_time,
                request_end_time: start_time,
                response_statistics: Vec::new(),
                supplemental_response_statistics: Vec::new(),
                address_resolutions: Vec::new(),
                resolution_index: HashMap::new(),
                contacted_regions: OrderedSet::default(),
                contacted_replicas: OrderedSet::default(),
                failed_replicas: OrderedSet::default(),
                tracker: AddressResolutionTracker::new(),
            }),
            completed: AtomicBool::new(false),
        }
    }

    pub fn activity_id(&self) -> Uuid {
        self.activity_id
    }

    // Every critical section leaves the state consistent, so a poisoned
    // lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, DiagnosticsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of one backend call.
    pub fn record_response(
        &self,
        endpoint: &str,
        resource_type: ResourceType,
        operation_type: OperationType,
        store_result: StoreResult,
        is_supplemental: bool,
        now: Timestamp,
    ) {
        let failed = store_result.is_failure();
        let statistic = ResponseStatistic {
            response_time: now,
            store_result,
            resource_type,
            operation_type,
        };
        let host = extract_host(endpoint);

        {
            let mut state = self.lock();
            state.observe(now);
            if let Some(host) = host.as_deref() {
                state.contacted_regions.insert(host);
            }
            state.contacted_replicas.insert(endpoint);
            if failed {
                state.failed_replicas.insert(endpoint);
            }
            if is_supplemental {
                state.supplemental_response_statistics.push(statistic);
            } else {
                state.response_statistics.push(statistic);
            }
        }

        tracing::debug!(
            activity_id = %self.activity_id,
            endpoint = %endpoint,
            resource_type = %resource_type,
            operation_type = %operation_type,
            supplemental = is_supplemental,
            failed,
            "Recorded backend response"
        );
        metrics::record_response(is_supplemental, failed);
    }

    /// Open an address resolution and return its identifier.
    pub fn start_address_resolution(
        &self,
        target_endpoint: Option<&str>,
        now: Timestamp,
    ) -> ResolutionId {
        let target = match target_endpoint {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => NULL_ENDPOINT.to_string(),
        };

        let identifier = {
            let mut state = self.lock();
            let identifier = state.tracker.allocate();
            let index = state.address_resolutions.len();
            state.address_resolutions.push(AddressResolutionStatistic {
                identifier: identifier.clone(),
                start_time: now,
                end_time: None,
                target_endpoint: target,
                error_message: None,
                inflight_request: true,
            });
            state.resolution_index.insert(identifier.clone(), index);
            identifier
        };

        tracing::debug!(
            activity_id = %self.activity_id,
            identifier = %identifier,
            target_endpoint = ?target_endpoint,
            "Address resolution started"
        );
        metrics::record_resolution_started();
        identifier
    }

    /// Close an address resolution.
    ///
    /// An absent or empty identifier is ignored. An identifier that is not
    /// currently open is a [`DiagnosticsError::ProtocolViolation`].
    pub fn end_address_resolution(
        &self,
        identifier: Option<&ResolutionId>,
        error_message: Option<&str>,
        now: Timestamp,
    ) -> DiagnosticsResult<()> {
        let identifier = match identifier {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(()),
        };
        let error_message = error_message.filter(|m| !m.is_empty());

        {
            let mut state = self.lock();
            if !state.tracker.close(identifier) {
                let already_closed = state.tracker.is_retired(identifier);
                drop(state);
                tracing::warn!(
                    activity_id = %self.activity_id,
                    identifier = %identifier,
                    already_closed,
                    "Address resolution ended without a matching start"
                );
                metrics::record_protocol_violation();
                return Err(DiagnosticsError::ProtocolViolation {
                    identifier: identifier.clone(),
                });
            }

            state.observe(now);
            let index = state.resolution_index.get(identifier).copied();
            if let Some(index) = index {
                let record = &mut state.address_resolutions[index];
                record.end_time = Some(now);
                record.error_message = error_message.map(str::to_string);
                record.inflight_request = false;
            }
        }

        tracing::debug!(
            activity_id = %self.activity_id,
            identifier = %identifier,
            error = ?error_message,
            "Address resolution ended"
        );
        metrics::record_resolution_completed(error_message.is_some());
        Ok(())
    }

    /// Best current lower bound on the request's total latency.
    pub fn request_latency(&self) -> Duration {
        let state = self.lock();
        (state.request_end_time - state.request_start_time)
            .to_std()
            .unwrap_or_default()
    }

    /// Copy the current state for report generation.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let state = self.lock();
        DiagnosticsSnapshot {
            activity_id: self.activity_id,
            request_start_time: state.request_start_time,
            request_end_time: state.request_end_time,
            response_statistics: state.response_statistics.clone(),
            supplemental_response_statistics: state.supplemental_response_statistics.clone(),
            address_resolution_statistics: state.address_resolutions.clone(),
            contacted_regions: state.contacted_regions.items.clone(),
            contacted_replicas: state.contacted_replicas.items.clone(),
            failed_replicas: state.failed_replicas.items.clone(),
        }
    }

    /// Snapshot and format in one step. Read-only; may be called any number of times.
    pub fn report(&self, formatter: &ReportFormatter) -> DiagnosticsReport {
        formatter.format(&self.snapshot())
    }

    /// Final report for a finished request.
    ///
    /// The latency histogram and the omitted-entries counter are emitted on
    /// the first call only; later calls just format.
    pub fn complete(&self, formatter: &ReportFormatter) -> DiagnosticsReport {
        let snapshot = self.snapshot();
        let report = formatter.format(&snapshot);
        if !self.completed.swap(true, Ordering::AcqRel) {
            metrics::record_request_latency(snapshot.elapsed());
            if report.supplemental.omitted > 0 {
                metrics::record_supplemental_omitted(report.supplemental.omitted);
            }
        }
        report
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// Host portion of an endpoint. Bare host names are accepted too.
pub fn extract_host(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return None;
    }
    let host_of = |url: Url| url.host_str().filter(|h| !h.is_empty()).map(str::to_string);

    if endpoint.contains("://") {
        return Url::parse(endpoint).ok().and_then(host_of);
    }
    // "eastus" or "replica-1:14000": no scheme, so `Url` would either reject
    // it or read the host as a scheme.
    Url::parse(&format!("https://{}", endpoint)).ok().and_then(host_of)
}
