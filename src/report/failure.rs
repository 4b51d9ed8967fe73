//! Error object carrying a diagnostics report.
//!
//! The outer client raises this when a logical request fails so the
//! per-region latency and resolution history travel with the failure.

use thiserror::Error;

use crate::report::formatter::DiagnosticsReport;

/// A failed logical request together with its diagnostics.
#[derive(Debug, Clone, Error)]
#[error(
    "Request failed with status {status_code}{}: {message} (activity_id={}, duration={} ms)",
    sub_status_suffix(.sub_status),
    .diagnostics.activity_id,
    .diagnostics.duration_ms
)]
pub struct OperationFailure {
    status_code: u16,
    sub_status: Option<u32>,
    message: String,
    diagnostics: Box<DiagnosticsReport>,
}

impl OperationFailure {
    pub fn new(status_code: u16, message: impl Into<String>, diagnostics: DiagnosticsReport) -> Self {
        Self {
            status_code,
            sub_status: None,
            message: message.into(),
            diagnostics: Box::new(diagnostics),
        }
    }

    pub fn with_sub_status(mut self, sub_status: u32) -> Self {
        self.sub_status = Some(sub_status);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn sub_status(&self) -> Option<u32> {
        self.sub_status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn diagnostics(&self) -> &DiagnosticsReport {
        &self.diagnostics
    }
}

fn sub_status_suffix(sub_status: &Option<u32>) -> String {
    sub_status.map(|sub| format!("/{}", sub)).unwrap_or_default()
}
