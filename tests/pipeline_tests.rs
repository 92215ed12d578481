use std::io::Write;

use addonscan::models::{ScanRecord, ScanStatus, Severity};
use addonscan::pipeline::{Scheduler, run_scan};
use addonscan::store::ScanStore;
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn extension_zip() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp archive");
    let mut writer = ZipWriter::new(file.as_file_mut());
    writer
        .start_file("manifest.json", SimpleFileOptions::default())
        .expect("start");
    writer
        .write_all(br#"{"permissions": ["tabs"]}"#)
        .expect("write manifest");
    writer
        .start_file("app.js", SimpleFileOptions::default())
        .expect("start");
    writer
        .write_all(b"a.innerHTML = x;\nfetch('http://example.com/api');\n")
        .expect("write script");
    writer.finish().expect("finish");
    file
}

#[tokio::test]
async fn scan_reaches_completed_with_summary_and_score() {
    let store = ScanStore::new();
    store
        .insert(ScanRecord::new(
            "scan-1".to_string(),
            "extension.zip".to_string(),
            1024,
        ))
        .await;
    let upload = extension_zip().into_temp_path();
    let upload_location = upload.to_path_buf();

    run_scan(store.clone(), "scan-1".to_string(), upload).await;

    let record = store.get("scan-1").await.expect("record");
    assert_eq!(record.status, ScanStatus::Completed);
    assert_eq!(record.progress, 100);

    // tabs -> HIGH, no CSP -> INFO, innerHTML -> CRITICAL, http -> MEDIUM
    assert_eq!(record.issues.len(), 4);
    assert_eq!(record.summary.total_issues, 4);
    assert_eq!(record.summary.high, 1);
    assert_eq!(record.summary.info, 1);
    assert_eq!(record.summary.critical, 1);
    assert_eq!(record.summary.medium, 1);
    assert_eq!(record.security_score, Some(100 - 25 - 15 - 10));

    // Manifest issues precede script issues.
    assert_eq!(record.issues[0].file, "manifest.json");
    assert!(record.issues[2..].iter().all(|i| i.file == "app.js"));

    assert_eq!(record.file_contents.len(), 2);
    assert!(record.file_contents.contains_key("manifest.json"));
    assert!(record.file_contents.contains_key("app.js"));

    assert!(!upload_location.exists(), "upload temp file must be removed");
}

#[tokio::test]
async fn corrupt_archive_ends_in_error_state_and_cleans_up() {
    let store = ScanStore::new();
    store
        .insert(ScanRecord::new(
            "scan-2".to_string(),
            "broken.zip".to_string(),
            64,
        ))
        .await;
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(b"not an archive").expect("write");
    let upload = file.into_temp_path();
    let upload_location = upload.to_path_buf();

    run_scan(store.clone(), "scan-2".to_string(), upload).await;

    let record = store.get("scan-2").await.expect("record");
    assert_eq!(record.status, ScanStatus::Error);
    assert_eq!(record.progress, 100);
    assert!(record.error.is_some());
    assert!(record.security_score.is_none());
    assert!(record.issues.is_empty());

    assert!(!upload_location.exists(), "upload temp file must be removed");
}

#[tokio::test]
async fn archive_without_manifest_still_completes() {
    let store = ScanStore::new();
    store
        .insert(ScanRecord::new(
            "scan-3".to_string(),
            "scripts-only.zip".to_string(),
            128,
        ))
        .await;
    let mut file = NamedTempFile::new().expect("create temp archive");
    let mut writer = ZipWriter::new(file.as_file_mut());
    writer
        .start_file("only.js", SimpleFileOptions::default())
        .expect("start");
    writer
        .write_all(b"fetch('http://example.com');")
        .expect("write");
    writer.finish().expect("finish");

    run_scan(store.clone(), "scan-3".to_string(), file.into_temp_path()).await;

    let record = store.get("scan-3").await.expect("record");
    assert_eq!(record.status, ScanStatus::Completed);
    assert_eq!(record.issues.len(), 1);
    assert_eq!(record.issues[0].severity, Severity::Medium);
    assert_eq!(record.file_contents.len(), 1);
    assert!(!record.file_contents.contains_key("manifest.json"));
}

#[tokio::test]
async fn scheduler_drain_waits_for_spawned_scans() {
    let store = ScanStore::new();
    let scheduler = Scheduler::new();
    store
        .insert(ScanRecord::new(
            "scan-4".to_string(),
            "extension.zip".to_string(),
            1024,
        ))
        .await;
    let upload = extension_zip().into_temp_path();

    scheduler
        .spawn(run_scan(store.clone(), "scan-4".to_string(), upload))
        .await;
    scheduler.drain().await;

    let record = store.get("scan-4").await.expect("record");
    assert!(record.status.is_terminal());
    assert_eq!(record.progress, 100);
}
