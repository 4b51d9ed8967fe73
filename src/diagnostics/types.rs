//! Diagnostic record types and error definitions.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Wall-clock instant recorded by the diagnostics layer.
pub type Timestamp = DateTime<Utc>;

/// Target endpoint recorded when a resolution is started without one.
pub const NULL_ENDPOINT: &str = "<NULL>";

/// Render a timestamp the way every report line does.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Kind of resource a backend call touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    DatabaseAccount,
    Database,
    Container,
    Document,
    StoredProcedure,
    Trigger,
    UserDefinedFunction,
    PartitionKeyRange,
    Offer,
    User,
    Permission,
    Conflict,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::DatabaseAccount => "DatabaseAccount",
            ResourceType::Database => "Database",
            ResourceType::Container => "Container",
            ResourceType::Document => "Document",
            ResourceType::StoredProcedure => "StoredProcedure",
            ResourceType::Trigger => "Trigger",
            ResourceType::UserDefinedFunction => "UserDefinedFunction",
            ResourceType::PartitionKeyRange => "PartitionKeyRange",
            ResourceType::Offer => "Offer",
            ResourceType::User => "User",
            ResourceType::Permission => "Permission",
            ResourceType::Conflict => "Conflict",
        }
    }

    const ALL: [ResourceType; 12] = [
        ResourceType::DatabaseAccount,
        ResourceType::Database,
        ResourceType::Container,
        ResourceType::Document,
        ResourceType::StoredProcedure,
        ResourceType::Trigger,
        ResourceType::UserDefinedFunction,
        ResourceType::PartitionKeyRange,
        ResourceType::Offer,
        ResourceType::User,
        ResourceType::Permission,
        ResourceType::Conflict,
    ];
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "resource type",
                value: s.to_string(),
            })
    }
}

/// Operation a backend call performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Create,
    Read,
    ReadFeed,
    Replace,
    Upsert,
    Patch,
    Delete,
    Query,
    Execute,
    Batch,
    Head,
    HeadFeed,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "Create",
            OperationType::Read => "Read",
            OperationType::ReadFeed => "ReadFeed",
            OperationType::Replace => "Replace",
            OperationType::Upsert => "Upsert",
            OperationType::Patch => "Patch",
            OperationType::Delete => "Delete",
            OperationType::Query => "Query",
            OperationType::Execute => "Execute",
            OperationType::Batch => "Batch",
            OperationType::Head => "Head",
            OperationType::HeadFeed => "HeadFeed",
        }
    }

    const ALL: [OperationType; 12] = [
        OperationType::Create,
        OperationType::Read,
        OperationType::ReadFeed,
        OperationType::Replace,
        OperationType::Upsert,
        OperationType::Patch,
        OperationType::Delete,
        OperationType::Query,
        OperationType::Execute,
        OperationType::Batch,
        OperationType::Head,
        OperationType::HeadFeed,
    ];
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "operation type",
                value: s.to_string(),
            })
    }
}

/// Returned when parsing a resource or operation type from text fails.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Outcome of one backend call as handed over by the transport.
///
/// The recorder keeps it verbatim; only [`StoreResult::is_failure`] is
/// consulted, to maintain the failed-replica list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreResult {
    /// HTTP-style status code returned by the replica.
    pub status_code: u16,
    /// Service-specific sub-status, if any.
    pub sub_status_code: Option<u32>,
    /// Request units charged for the call.
    pub request_charge: f64,
    /// Logical sequence number observed on the replica.
    pub lsn: Option<i64>,
    /// Transport or service error text. `None` means the call completed.
    pub error_message: Option<String>,
}

impl StoreResult {
    /// A completed call with the given status.
    pub fn success(status_code: u16) -> Self {
        Self {
            status_code,
            sub_status_code: None,
            request_charge: 0.0,
            lsn: None,
            error_message: None,
        }
    }

    /// A call that failed with the given status and message.
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::success(status_code)
        }
    }

    pub fn with_sub_status(mut self, sub_status_code: u32) -> Self {
        self.sub_status_code = Some(sub_status_code);
        self
    }

    pub fn with_request_charge(mut self, request_charge: f64) -> Self {
        self.request_charge = request_charge;
        self
    }

    pub fn with_lsn(mut self, lsn: i64) -> Self {
        self.lsn = Some(lsn);
        self
    }

    /// Whether the replica itself misbehaved.
    ///
    /// 404, 409 and 412 are semantic answers (not found, conflict,
    /// precondition failed) and do not mark the replica as failed.
    pub fn is_failure(&self) -> bool {
        if self.error_message.is_some() {
            return true;
        }
        match self.status_code {
            404 | 409 | 412 => false,
            code => code >= 400,
        }
    }
}

impl fmt::Display for StoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreResult{{status={}", self.status_code)?;
        if let Some(sub) = self.sub_status_code {
            write!(f, ", sub_status={}", sub)?;
        }
        write!(f, ", charge={:.2}", self.request_charge)?;
        if let Some(lsn) = self.lsn {
            write!(f, ", lsn={}", lsn)?;
        }
        if let Some(err) = &self.error_message {
            write!(f, ", error='{}'", err)?;
        }
        f.write_str("}")
    }
}

/// One backend call observed during a logical request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseStatistic {
    pub response_time: Timestamp,
    pub store_result: StoreResult,
    pub resource_type: ResourceType,
    pub operation_type: OperationType,
}

impl fmt::Display for ResponseStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResponseStatistic{{response_time=\"{}\", resource_type={}, operation_type={}, result={}}}",
            format_timestamp(&self.response_time),
            self.resource_type,
            self.operation_type,
            self.store_result,
        )
    }
}

/// Identifier handed out by `start_address_resolution`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionId(String);

impl ResolutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty identifier stands for "no start token was captured".
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ResolutionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResolutionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of an address resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionState {
    /// Started, not yet closed.
    Pending,
    /// Closed without an error message.
    Resolved,
    /// Closed with an error message.
    Failed,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionState::Pending => "Pending",
            ResolutionState::Resolved => "Resolved",
            ResolutionState::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// One address lookup bracketed by start/end calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressResolutionStatistic {
    pub identifier: ResolutionId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub target_endpoint: String,
    pub error_message: Option<String>,
    /// Still running. A background resolution may outlive the user-visible
    /// request when another replica answered first.
    pub inflight_request: bool,
}

impl AddressResolutionStatistic {
    pub fn state(&self) -> ResolutionState {
        if self.inflight_request {
            ResolutionState::Pending
        } else if self.error_message.is_some() {
            ResolutionState::Failed
        } else {
            ResolutionState::Resolved
        }
    }
}

impl fmt::Display for AddressResolutionStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .end_time
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "AddressResolution{{id={}, state={}, start_time=\"{}\", end_time=\"{}\", inflight_request={}, target_endpoint='{}', error_message='{}'}}",
            self.identifier,
            self.state(),
            format_timestamp(&self.start_time),
            end,
            self.inflight_request,
            self.target_endpoint,
            self.error_message.as_deref().unwrap_or(""),
        )
    }
}

/// Errors raised by the diagnostics recorder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticsError {
    /// `end_address_resolution` was called for an identifier that is not open.
    #[error("address resolution {identifier} is not open; start must be called once before end")]
    ProtocolViolation { identifier: ResolutionId },
}

/// Result type for recorder operations.
pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_micros(1_999)), 1);
        assert_eq!(duration_millis(Duration::from_secs(3)), 3_000);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_store_result_failure_classification() {
        assert!(!StoreResult::success(200).is_failure());
        assert!(!StoreResult::success(404).is_failure());
        assert!(!StoreResult::success(412).is_failure());
        assert!(StoreResult::success(503).is_failure());
        assert!(StoreResult::success(429).is_failure());
        assert!(StoreResult::failure(200, "connection reset").is_failure());
    }

    #[test]
    fn test_parse_types_case_insensitive() {
        assert_eq!("document".parse::<ResourceType>().unwrap(), ResourceType::Document);
        assert_eq!("HEADFEED".parse::<OperationType>().unwrap(), OperationType::HeadFeed);

        let err = "table".parse::<ResourceType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown resource type: table");
    }

    #[test]
    fn test_resolution_state() {
        let start = Utc.timestamp_millis_opt(0).unwrap();
        let mut stat = AddressResolutionStatistic {
            identifier: "abc".into(),
            start_time: start,
            end_time: None,
            target_endpoint: NULL_ENDPOINT.to_string(),
            error_message: None,
            inflight_request: true,
        };
        assert_eq!(stat.state(), ResolutionState::Pending);
        assert!(stat.to_string().contains("end_time=\"-\""));

        stat.inflight_request = false;
        stat.end_time = Some(start);
        assert_eq!(stat.state(), ResolutionState::Resolved);

        stat.error_message = Some("dns failure".into());
        assert_eq!(stat.state(), ResolutionState::Failed);
    }

    #[test]
    fn test_error_display() {
        let err = DiagnosticsError::ProtocolViolation {
            identifier: "deadbeef".into(),
        };
        assert!(err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_store_result_display() {
        let result = StoreResult::failure(503, "unavailable")
            .with_sub_status(1007)
            .with_request_charge(1.5);
        assert_eq!(
            result.to_string(),
            "StoreResult{status=503, sub_status=1007, charge=1.50, error='unavailable'}"
        );
    }
}
