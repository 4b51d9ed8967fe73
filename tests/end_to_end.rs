//! End-to-end diagnostics scenarios.

use request_diagnostics::diagnostics::{DiagnosticsError, RequestDiagnostics, ResolutionState};
use request_diagnostics::report::ReportFormatter;
use std::time::Duration;

mod common;
use common::{at, record_head_feed, record_read};

#[test]
fn test_single_region_request_with_resolution() {
    let diagnostics = RequestDiagnostics::new(at(0));

    record_read(&diagnostics, "eastus", 50);
    assert_eq!(diagnostics.snapshot().request_end_time, at(50));

    let a = diagnostics.start_address_resolution(Some("r1.contoso.com"), at(60));

    record_read(&diagnostics, "eastus", 80);
    assert_eq!(diagnostics.snapshot().request_end_time, at(80));

    diagnostics
        .end_address_resolution(Some(&a), Some(""), at(90))
        .expect("resolution A is open");
    let snapshot = diagnostics.snapshot();
    assert_eq!(snapshot.request_end_time, at(90));
    assert_eq!(snapshot.address_resolution_statistics[0].state(), ResolutionState::Resolved);
    assert_eq!(diagnostics.request_latency(), Duration::from_millis(90));

    let report = ReportFormatter::default().format(&snapshot);
    assert_eq!(report.response_statistics.len(), 2);
    assert_eq!(report.supplemental.total, 0);
    assert!(report.supplemental.entries.is_empty());
    assert_eq!(report.address_resolution_statistics.len(), 1);
    assert_eq!(report.resolutions_in(ResolutionState::Resolved), 1);
    assert_eq!(report.regions_attempted, 1);
    assert_eq!(report.contacted_regions, vec!["eastus"]);
    assert_eq!(report.duration_ms, 90);
}

#[test]
fn test_double_close_is_protocol_violation() {
    let diagnostics = RequestDiagnostics::new(at(0));
    let id = diagnostics.start_address_resolution(Some("r1.contoso.com"), at(1));

    diagnostics.end_address_resolution(Some(&id), None, at(2)).unwrap();
    let err = diagnostics
        .end_address_resolution(Some(&id), Some("late failure"), at(3))
        .unwrap_err();

    assert_eq!(err, DiagnosticsError::ProtocolViolation { identifier: id });
    let record = &diagnostics.snapshot().address_resolution_statistics[0];
    assert_eq!(record.state(), ResolutionState::Resolved);
    assert_eq!(record.end_time, Some(at(2)));
}

#[test]
fn test_supplemental_report_cap() {
    let diagnostics = RequestDiagnostics::new(at(0));
    for ms in 1..=15 {
        record_head_feed(&diagnostics, "https://eastus.db.example.net/", ms);
    }

    let report = diagnostics.report(&ReportFormatter::new(10));
    assert_eq!(report.supplemental.total, 15);
    assert_eq!(report.supplemental.omitted, 5);
    let lsns: Vec<_> = report
        .supplemental
        .entries
        .iter()
        .map(|s| s.store_result.lsn.unwrap())
        .collect();
    assert_eq!(lsns, (6..=15).collect::<Vec<i64>>());

    let text = report.to_string();
    assert!(text.contains("5 earlier omitted"));
    assert!(text.contains("Total supplemental requests: 15"));
}

#[test]
fn test_pending_resolution_in_report() {
    let diagnostics = RequestDiagnostics::new(at(0));
    let _background = diagnostics.start_address_resolution(None, at(5));
    record_read(&diagnostics, "westus", 30);

    let report = diagnostics.report(&ReportFormatter::default());
    assert_eq!(report.resolutions_in(ResolutionState::Pending), 1);
    let pending = &report.address_resolution_statistics[0];
    assert!(pending.inflight_request);
    assert!(pending.end_time.is_none());
    assert_eq!(pending.target_endpoint, "<NULL>");
    assert_eq!(report.duration_ms, 30);
}
