use std::time::Duration;

use addonscan::models::{ScanRecord, ScanStatus, Severity};
use addonscan::rules;
use addonscan::store::ScanStore;
use addonscan::{Issue, Summary};

fn record(scan_id: &str) -> ScanRecord {
    ScanRecord::new(scan_id.to_string(), "extension.zip".to_string(), 2048)
}

#[tokio::test]
async fn progress_is_monotonic() {
    let store = ScanStore::new();
    store.insert(record("scan")).await;
    store.begin("scan").await;

    store.set_progress("scan", 50).await;
    store.set_progress("scan", 25).await;

    assert_eq!(store.get("scan").await.unwrap().progress, 50);
}

#[tokio::test]
async fn terminal_state_is_set_once_and_frozen() {
    let store = ScanStore::new();
    store.insert(record("scan")).await;
    store.begin("scan").await;
    store.finalize("scan").await;

    store.set_progress("scan", 10).await;
    store.fail("scan", "too late".to_string()).await;

    let record = store.get("scan").await.unwrap();
    assert_eq!(record.status, ScanStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(record.error.is_none());
}

#[tokio::test]
async fn finalize_derives_summary_and_score_from_accumulated_issues() {
    let store = ScanStore::new();
    store.insert(record("scan")).await;
    store.begin("scan").await;
    store
        .append_issues(
            "scan",
            vec![
                Issue::from_rule(&rules::UNSAFE_INNER_HTML, "a.js"),
                Issue::from_rule(&rules::HTTP_COMMUNICATION, "a.js"),
                Issue::from_rule(&rules::MINIMAL_PERMISSIONS, "manifest.json"),
            ],
        )
        .await;

    store.finalize("scan").await;

    let record = store.get("scan").await.unwrap();
    assert_eq!(record.summary.total_issues, 3);
    assert_eq!(record.summary.critical, 1);
    assert_eq!(record.summary.medium, 1);
    assert_eq!(record.summary.info, 1);
    assert_eq!(record.security_score, Some(100 - 25 - 10));
}

#[tokio::test]
async fn failure_keeps_accumulated_issues_without_summary() {
    let store = ScanStore::new();
    store.insert(record("scan")).await;
    store.begin("scan").await;
    store
        .append_issues(
            "scan",
            vec![
                Issue::from_rule(&rules::EXCESSIVE_PERMISSIONS, "manifest.json")
                    .with_severity(Severity::High),
            ],
        )
        .await;

    store.fail("scan", "archive went sideways".to_string()).await;

    let record = store.get("scan").await.unwrap();
    assert_eq!(record.status, ScanStatus::Error);
    assert_eq!(record.progress, 100);
    assert_eq!(record.issues.len(), 1);
    assert_eq!(record.summary, Summary::default());
    assert!(record.security_score.is_none());
    assert_eq!(record.error.as_deref(), Some("archive went sideways"));
}

#[tokio::test]
async fn unknown_scan_id_reads_as_none_and_updates_are_ignored() {
    let store = ScanStore::new();

    store.set_progress("missing", 50).await;

    assert!(store.get("missing").await.is_none());
}

#[tokio::test]
async fn eviction_removes_only_expired_terminal_records() {
    let store = ScanStore::new();
    store.insert(record("done")).await;
    store.insert(record("running")).await;
    store.begin("running").await;
    store.finalize("done").await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    store.evict_older_than(Duration::from_millis(10)).await;

    assert!(store.get("done").await.is_none());
    assert!(store.get("running").await.is_some());
}

#[tokio::test]
async fn fresh_terminal_records_survive_eviction() {
    let store = ScanStore::new();
    store.insert(record("done")).await;
    store.finalize("done").await;

    store.evict_older_than(Duration::from_secs(3600)).await;

    assert!(store.get("done").await.is_some());
}
