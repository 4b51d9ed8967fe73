//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDiagnostics / ReportFormatter produce:
//!     → logging.rs (structured tracing events keyed by activity_id)
//!     → metrics.rs (counters and histograms through the `metrics` facade)
//!
//! Consumers:
//!     → whatever subscriber the host installs (init_logging for binaries)
//!     → whatever metrics recorder the host installs (none by default)
//! ```
//!
//! # Design Decisions
//! - The library never installs a global recorder or subscriber on its own
//! - Metric updates are cheap and safe to call outside the aggregate lock

pub mod logging;
pub mod metrics;
