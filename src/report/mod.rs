//! Report generation subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDiagnostics::snapshot()
//!     → formatter.rs (cap supplemental entries, build DiagnosticsReport)
//!     → Display (text for log lines) / to_json (structured sinks)
//!     → failure.rs (attach to OperationFailure when the request failed)
//! ```

pub mod failure;
pub mod formatter;

pub use failure::OperationFailure;
pub use formatter::{DiagnosticsReport, ReportFormatter, SupplementalSection, DEFAULT_MAX_SUPPLEMENTAL_ENTRIES};
