//! Snapshot → report rendering.
//!
//! # Responsibilities
//! - Summarize timing and regions in a header
//! - Keep every primary call and every address resolution
//! - Cap supplemental calls to the most recent entries
//!
//! # Design Decisions
//! - Pure function of the snapshot and the cap; no clock, no locks
//! - Output is deterministic: same snapshot, same text and JSON

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::diagnostics::types::{duration_millis, format_timestamp, ResolutionState};
use crate::diagnostics::{AddressResolutionStatistic, DiagnosticsSnapshot, ResponseStatistic, Timestamp};

/// Supplemental entries shown when no cap is configured.
pub const DEFAULT_MAX_SUPPLEMENTAL_ENTRIES: usize = 10;

/// The capped supplemental section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplementalSection {
    /// Supplemental calls recorded in total.
    pub total: usize,
    /// Older calls left out of `entries`.
    pub omitted: usize,
    /// The most recent calls, oldest first.
    pub entries: Vec<ResponseStatistic>,
}

/// Bounded summary of one request's diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub activity_id: Uuid,
    pub request_start_time: Timestamp,
    pub request_end_time: Timestamp,
    pub duration_ms: u64,
    pub regions_attempted: usize,
    pub contacted_regions: Vec<String>,
    pub contacted_replicas: usize,
    pub failed_replicas: Vec<String>,
    pub response_statistics: Vec<ResponseStatistic>,
    pub supplemental: SupplementalSection,
    pub address_resolution_statistics: Vec<AddressResolutionStatistic>,
}

impl DiagnosticsReport {
    /// Line announcing truncated supplemental entries, if any were dropped.
    pub fn omission_marker(&self) -> Option<String> {
        if self.supplemental.omitted == 0 {
            return None;
        }
        Some(format!(
            "-- Showing only the last {} supplemental requests; {} earlier omitted. Total supplemental requests: {}",
            self.supplemental.entries.len(),
            self.supplemental.omitted,
            self.supplemental.total,
        ))
    }

    /// Count of address resolutions in the given state.
    pub fn resolutions_in(&self, state: ResolutionState) -> usize {
        self.address_resolution_statistics
            .iter()
            .filter(|s| s.state() == state)
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RequestDiagnostics{{activity_id={}, start_time=\"{}\", end_time=\"{}\", duration={} ms, regions_attempted={}}}",
            self.activity_id,
            format_timestamp(&self.request_start_time),
            format_timestamp(&self.request_end_time),
            self.duration_ms,
            self.regions_attempted,
        )?;
        writeln!(
            f,
            "  regions=[{}], replicas_contacted={}, failed_replicas=[{}]",
            self.contacted_regions.join(", "),
            self.contacted_replicas,
            self.failed_replicas.join(", "),
        )?;

        writeln!(f, "  ResponseStatistics ({}):", self.response_statistics.len())?;
        for stat in &self.response_statistics {
            writeln!(f, "    {}", stat)?;
        }

        writeln!(
            f,
            "  AddressResolutionStatistics ({}):",
            self.address_resolution_statistics.len()
        )?;
        for stat in &self.address_resolution_statistics {
            writeln!(f, "    {}", stat)?;
        }

        writeln!(
            f,
            "  SupplementalResponseStatistics ({}):",
            self.supplemental.total
        )?;
        if let Some(marker) = self.omission_marker() {
            writeln!(f, "    {}", marker)?;
        }
        for stat in &self.supplemental.entries {
            writeln!(f, "    {}", stat)?;
        }
        Ok(())
    }
}

/// Turns snapshots into reports.
#[derive(Debug, Clone, Copy)]
pub struct ReportFormatter {
    max_supplemental_entries: usize,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUPPLEMENTAL_ENTRIES)
    }
}

impl ReportFormatter {
    pub fn new(max_supplemental_entries: usize) -> Self {
        Self {
            max_supplemental_entries,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.max_supplemental_entries)
    }

    pub fn max_supplemental_entries(&self) -> usize {
        self.max_supplemental_entries
    }

    /// Build the report for `snapshot`.
    pub fn format(&self, snapshot: &DiagnosticsSnapshot) -> DiagnosticsReport {
        let supplemental = &snapshot.supplemental_response_statistics;
        let total = supplemental.len();
        let first_shown = total.saturating_sub(self.max_supplemental_entries);

        DiagnosticsReport {
            activity_id: snapshot.activity_id,
            request_start_time: snapshot.request_start_time,
            request_end_time: snapshot.request_end_time,
            duration_ms: duration_millis(snapshot.elapsed()),
            regions_attempted: snapshot.contacted_regions.len(),
            contacted_regions: snapshot.contacted_regions.clone(),
            contacted_replicas: snapshot.contacted_replicas.len(),
            failed_replicas: snapshot.failed_replicas.clone(),
            response_statistics: snapshot.response_statistics.clone(),
            supplemental: SupplementalSection {
                total,
                omitted: first_shown,
                entries: supplemental[first_shown..].to_vec(),
            },
            address_resolution_statistics: snapshot.address_resolution_statistics.clone(),
        }
    }
}
