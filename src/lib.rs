//! Client-side request diagnostics for a replicated database client.

pub mod config;
pub mod diagnostics;
pub mod observability;
pub mod report;
pub mod simulation;

pub use config::DiagnosticsSettings;
pub use diagnostics::{DiagnosticsError, RequestDiagnostics};
pub use report::{DiagnosticsReport, OperationFailure, ReportFormatter};
