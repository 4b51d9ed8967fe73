//! Request diagnostics subsystem.
//!
//! # Data Flow
//! ```text
//! Operation start
//!     → request.rs (RequestDiagnostics::new, shared via Arc)
//!
//! Per backend call (any task):
//!     → record_response (primary or supplemental list, regions, replicas)
//!
//! Per address lookup (any task):
//!     → start_address_resolution → tracker.rs (issue identifier)
//!     → end_address_resolution   → tracker.rs (close, or ProtocolViolation)
//!
//! Operation end (success or failure):
//!     → snapshot() → report::ReportFormatter → logs / OperationFailure
//! ```
//!
//! # Design Decisions
//! - Typed records instead of loosely keyed maps
//! - The caller classifies primary vs supplemental calls
//! - Pending resolutions are a valid reportable state

pub mod clock;
pub mod request;
pub mod tracker;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use request::{DiagnosticsSnapshot, RequestDiagnostics};
pub use tracker::AddressResolutionTracker;
pub use types::{
    duration_millis, AddressResolutionStatistic, DiagnosticsError, DiagnosticsResult, OperationType,
    ResolutionId, ResolutionState, ResourceType, ResponseStatistic, StoreResult, Timestamp,
    NULL_ENDPOINT,
};
