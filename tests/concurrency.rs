//! Concurrent mutation of a shared RequestDiagnostics.

use std::collections::HashSet;
use std::sync::Arc;

use request_diagnostics::diagnostics::{OperationType, RequestDiagnostics, ResourceType, StoreResult};
use request_diagnostics::report::ReportFormatter;

mod common;
use common::at;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_record_response() {
    let diagnostics = Arc::new(RequestDiagnostics::new(at(0)));
    let tasks = 64;
    let per_task = 50;

    let handles: Vec<_> = (0..tasks)
        .map(|task| {
            let diagnostics = diagnostics.clone();
            tokio::spawn(async move {
                for i in 0..per_task {
                    let lsn = (task * per_task + i) as i64;
                    diagnostics.record_response(
                        &format!("https://region{}.db.example.net/", task % 4),
                        ResourceType::Document,
                        OperationType::Read,
                        StoreResult::success(200).with_lsn(lsn),
                        lsn % 5 == 0,
                        at(lsn),
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = diagnostics.snapshot();
    let total = tasks * per_task;
    let all: Vec<i64> = snapshot
        .response_statistics
        .iter()
        .chain(snapshot.supplemental_response_statistics.iter())
        .map(|s| s.store_result.lsn.unwrap())
        .collect();

    assert_eq!(all.len(), total);
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), total);
    assert_eq!(snapshot.supplemental_response_statistics.len(), total / 5);
    assert_eq!(snapshot.contacted_regions.len(), 4);
    assert_eq!(snapshot.request_end_time, at(total as i64 - 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_resolutions_get_distinct_ids() {
    let diagnostics = Arc::new(RequestDiagnostics::new(at(0)));

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let diagnostics = diagnostics.clone();
            tokio::spawn(async move {
                let id = diagnostics.start_address_resolution(Some("replica.db.example.net"), at(i));
                tokio::task::yield_now().await;
                if i % 2 == 0 {
                    diagnostics.end_address_resolution(Some(&id), None, at(i + 1)).unwrap();
                }
                id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 200);

    let report = diagnostics.report(&ReportFormatter::default());
    assert_eq!(report.address_resolution_statistics.len(), 200);
    assert_eq!(
        report.address_resolution_statistics.iter().filter(|s| s.inflight_request).count(),
        100
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshot_while_writing() {
    let diagnostics = Arc::new(RequestDiagnostics::new(at(0)));
    let writer = {
        let diagnostics = diagnostics.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                common::record_read(&diagnostics, "eastus", i);
                tokio::task::yield_now().await;
            }
        })
    };

    let mut last_len = 0;
    while !writer.is_finished() {
        let snapshot = diagnostics.snapshot();
        // append-only: a later snapshot never sees fewer entries
        assert!(snapshot.response_statistics.len() >= last_len);
        last_len = snapshot.response_statistics.len();
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert_eq!(diagnostics.snapshot().response_statistics.len(), 500);
}
