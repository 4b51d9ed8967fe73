//! Simulated transport driving the recorder.

use std::sync::Arc;

use request_diagnostics::config::SimulationConfig;
use request_diagnostics::diagnostics::{
    ManualClock, OperationType, ResolutionState, ResourceType, SystemClock,
};
use request_diagnostics::report::ReportFormatter;
use request_diagnostics::simulation::SimulatedTransport;

mod common;
use common::{at, replica, slow_resolution_config};

#[tokio::test]
async fn test_default_simulation() {
    let transport = SimulatedTransport::new(SimulationConfig::default(), Arc::new(SystemClock));
    let mut request = transport.execute(ResourceType::Document, OperationType::Read).await;
    request.settle().await;

    let formatter = ReportFormatter::default();
    assert!(request.outcome(&formatter).is_ok());

    let report = request.diagnostics().report(&formatter);
    assert_eq!(report.response_statistics.len(), 3);
    assert_eq!(report.supplemental.total, 12);
    assert_eq!(report.supplemental.omitted, 2);
    assert_eq!(report.regions_attempted, 2);
    assert_eq!(report.failed_replicas, vec!["https://westus.db.example.net:14001/replica/1"]);
    assert_eq!(report.resolutions_in(ResolutionState::Resolved), 3);
}

#[tokio::test]
async fn test_background_resolution_stays_pending() {
    let config = slow_resolution_config(vec![
        replica("https://eastus.db.example.net:1/", 5, 200),
        replica("https://eastus.db.example.net:2/", 5, 200),
    ]);
    let transport = SimulatedTransport::new(config, Arc::new(SystemClock));
    let mut request = transport.execute(ResourceType::Document, OperationType::Read).await;

    let before = request.diagnostics().snapshot();
    assert_eq!(before.pending_resolutions(), 2);
    let text = ReportFormatter::default().format(&before).to_string();
    assert!(text.contains("inflight_request=true"));

    request.settle().await;
    let after = request.diagnostics().snapshot();
    assert_eq!(after.pending_resolutions(), 0);
    assert!(after.request_end_time >= before.request_end_time);
}

#[tokio::test]
async fn test_all_replicas_failing_attaches_report() {
    // listed first but answers last
    let mut unavailable = replica("https://westus.db.example.net/", 60, 503);
    unavailable.error = Some("service unavailable".into());
    let mut throttled = replica("https://northeurope.db.example.net/", 1, 429);
    throttled.resolution_error = Some("dns lookup failed".into());
    let config = SimulationConfig {
        replicas: vec![unavailable, throttled],
        resolution_delay_ms: 0,
        metadata_calls: 0,
    };

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let transport = SimulatedTransport::new(config, clock);
    let mut request = transport.execute(ResourceType::Document, OperationType::Upsert).await;
    request.settle().await;

    let failure = request
        .outcome(&ReportFormatter::default())
        .expect_err("no replica succeeded");
    assert_eq!(failure.status_code(), 503);
    assert_eq!(failure.message(), "service unavailable");

    let report = failure.diagnostics();
    assert_eq!(report.failed_replicas.len(), 2);
    assert_eq!(report.regions_attempted, 2);
    assert_eq!(report.resolutions_in(ResolutionState::Failed), 1);
    assert_eq!(report.resolutions_in(ResolutionState::Resolved), 1);
    // the manual clock never moved
    assert_eq!(report.duration_ms, 0);
}

#[tokio::test]
async fn test_responses_follow_completion_order() {
    let config = SimulationConfig {
        replicas: vec![
            replica("https://slow.db.example.net:1/", 80, 200),
            replica("https://fast.db.example.net:1/", 1, 200),
        ],
        resolution_delay_ms: 0,
        metadata_calls: 0,
    };
    let transport = SimulatedTransport::new(config, Arc::new(SystemClock));
    let request = transport.execute(ResourceType::Document, OperationType::Read).await;

    let endpoints: Vec<&str> = request.responses().iter().map(|(e, _)| e.as_str()).collect();
    assert_eq!(
        endpoints,
        vec!["https://fast.db.example.net:1/", "https://slow.db.example.net:1/"]
    );
    assert_eq!(request.diagnostics().snapshot().contacted_replicas, endpoints);
}
