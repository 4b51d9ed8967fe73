//! Simulated transport.
//!
//! # Data Flow
//! ```text
//! execute(resource, operation)
//!     → RequestDiagnostics::new (shared via Arc)
//!     → metadata calls (recorded as supplemental)
//!     → per replica, in parallel:
//!         - background address resolution (start now, end after delay)
//!         - backend call (sleep latency, record_response)
//!     → SimulatedRequest (responses in completion order + handles of
//!       resolutions still running)
//! ```
//!
//! # Design Decisions
//! - Resolutions are not awaited by `execute`: a reply from one replica
//!   completes the request while lookups may still be in flight
//! - Primary/supplemental classification happens here, not in the recorder

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;

use crate::config::{ReplicaConfig, SimulationConfig};
use crate::diagnostics::{Clock, OperationType, RequestDiagnostics, ResourceType, StoreResult};
use crate::report::{OperationFailure, ReportFormatter};

/// Whether a call is background traffic rather than the user's operation.
pub fn is_supplemental(resource_type: ResourceType, operation_type: OperationType) -> bool {
    matches!(operation_type, OperationType::Head | OperationType::HeadFeed)
        || resource_type == ResourceType::PartitionKeyRange
}

/// Transport that fans a logical request out to configured fake replicas.
pub struct SimulatedTransport {
    config: SimulationConfig,
    clock: Arc<dyn Clock>,
}

/// A logical request issued through [`SimulatedTransport`].
pub struct SimulatedRequest {
    diagnostics: Arc<RequestDiagnostics>,
    responses: Vec<(String, StoreResult)>,
    resolutions: Vec<JoinHandle<()>>,
}

impl SimulatedTransport {
    pub fn new(config: SimulationConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Run one logical request against every replica.
    pub async fn execute(
        &self,
        resource_type: ResourceType,
        operation_type: OperationType,
    ) -> SimulatedRequest {
        let diagnostics = Arc::new(RequestDiagnostics::new(self.clock.now()));
        tracing::info!(
            activity_id = %diagnostics.activity_id(),
            resource_type = %resource_type,
            operation_type = %operation_type,
            replicas = self.config.replicas.len(),
            "Executing simulated request"
        );

        if let Some(first) = self.config.replicas.first() {
            for lsn in 0..self.config.metadata_calls {
                diagnostics.record_response(
                    &first.endpoint,
                    ResourceType::PartitionKeyRange,
                    OperationType::ReadFeed,
                    StoreResult::success(200).with_lsn(lsn as i64),
                    is_supplemental(ResourceType::PartitionKeyRange, OperationType::ReadFeed),
                    self.clock.now(),
                );
            }
        }

        let resolutions = self
            .config
            .replicas
            .iter()
            .map(|replica| self.spawn_resolution(&diagnostics, replica))
            .collect();

        let calls: Vec<JoinHandle<(String, StoreResult)>> = self
            .config
            .replicas
            .iter()
            .cloned()
            .map(|replica| {
                let diagnostics = diagnostics.clone();
                let clock = self.clock.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(replica.latency_ms)).await;
                    let result = match &replica.error {
                        Some(message) => StoreResult::failure(replica.status_code, message.clone()),
                        None => StoreResult::success(replica.status_code),
                    };
                    diagnostics.record_response(
                        &replica.endpoint,
                        resource_type,
                        operation_type,
                        result.clone(),
                        is_supplemental(resource_type, operation_type),
                        clock.now(),
                    );
                    (replica.endpoint, result)
                })
            })
            .collect();

        let mut pending: FuturesUnordered<_> = calls.into_iter().collect();
        let mut responses = Vec::with_capacity(pending.len());
        while let Some(joined) = pending.next().await {
            match joined {
                Ok(response) => responses.push(response),
                Err(e) => tracing::warn!(error = %e, "Simulated backend call panicked"),
            }
        }

        SimulatedRequest {
            diagnostics,
            responses,
            resolutions,
        }
    }

    fn spawn_resolution(
        &self,
        diagnostics: &Arc<RequestDiagnostics>,
        replica: &ReplicaConfig,
    ) -> JoinHandle<()> {
        let identifier = diagnostics.start_address_resolution(Some(&replica.endpoint), self.clock.now());
        let diagnostics = diagnostics.clone();
        let clock = self.clock.clone();
        let delay = Duration::from_millis(self.config.resolution_delay_ms);
        let error = replica.resolution_error.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = diagnostics.end_address_resolution(Some(&identifier), error.as_deref(), clock.now()) {
                tracing::error!(error = %e, "Simulated resolution closed twice");
            }
        })
    }
}

impl SimulatedRequest {
    pub fn diagnostics(&self) -> &Arc<RequestDiagnostics> {
        &self.diagnostics
    }

    /// Responses in arrival order.
    pub fn responses(&self) -> &[(String, StoreResult)] {
        &self.responses
    }

    /// Wait for background address resolutions to finish.
    pub async fn settle(&mut self) {
        for handle in self.resolutions.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Simulated address resolution task failed");
            }
        }
    }

    /// The first good response, or a failure carrying the report.
    pub fn outcome(&self, formatter: &ReportFormatter) -> Result<StoreResult, OperationFailure> {
        if let Some((_, result)) = self.responses.iter().find(|(_, r)| !r.is_failure()) {
            return Ok(result.clone());
        }

        let report = self.diagnostics.report(formatter);
        let failure = match self.responses.last() {
            Some((endpoint, result)) => {
                let message = result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("replica {} answered {}", endpoint, result.status_code));
                let failure = OperationFailure::new(result.status_code, message, report);
                match result.sub_status_code {
                    Some(sub) => failure.with_sub_status(sub),
                    None => failure,
                }
            }
            None => OperationFailure::new(503, "no replica answered", report),
        };
        tracing::warn!(error = %failure, "Simulated request failed");
        Err(failure)
    }
}
