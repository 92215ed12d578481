use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::models::{Issue, ScanRecord, ScanStatus, Summary};

/// Process-wide table of scan records, shared between the HTTP handlers and
/// the per-scan background tasks. Cheap to clone; all clones see one table.
#[derive(Clone, Default)]
pub struct ScanStore {
    records: Arc<RwLock<HashMap<String, ScanRecord>>>,
}

impl ScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ScanRecord) {
        self.records
            .write()
            .await
            .insert(record.scan_id.clone(), record);
    }

    pub async fn get(&self, scan_id: &str) -> Option<ScanRecord> {
        self.records.read().await.get(scan_id).cloned()
    }

    /// Move a freshly uploaded scan into the processing state.
    pub async fn begin(&self, scan_id: &str) {
        self.update(scan_id, |record| {
            if record.status == ScanStatus::Uploaded {
                record.status = ScanStatus::Processing;
            }
        })
        .await;
    }

    /// Progress only ever moves forward, and never past a terminal state.
    pub async fn set_progress(&self, scan_id: &str, progress: u8) {
        self.update(scan_id, |record| {
            if !record.status.is_terminal() {
                record.progress = record.progress.max(progress);
            }
        })
        .await;
    }

    pub async fn record_file(&self, scan_id: &str, name: &str, content: String) {
        self.update(scan_id, |record| {
            record.file_contents.insert(name.to_string(), content);
        })
        .await;
    }

    pub async fn append_issues(&self, scan_id: &str, issues: Vec<Issue>) {
        self.update(scan_id, |record| {
            record.issues.extend(issues);
        })
        .await;
    }

    /// Complete a scan: summary, score, terminal status and full progress land
    /// in one mutation, so readers never observe a half-finished completion.
    pub async fn finalize(&self, scan_id: &str) {
        self.update(scan_id, |record| {
            if record.status.is_terminal() {
                return;
            }
            let summary = Summary::from_issues(&record.issues);
            record.security_score = Some(summary.security_score());
            record.summary = summary;
            record.status = ScanStatus::Completed;
            record.progress = 100;
            record.finished_at = Some(Instant::now());
        })
        .await;
    }

    /// Record a scan-level failure. Issues gathered before the failure are
    /// kept; summary and score stay uncomputed.
    pub async fn fail(&self, scan_id: &str, message: String) {
        self.update(scan_id, |record| {
            if record.status.is_terminal() {
                return;
            }
            record.status = ScanStatus::Error;
            record.progress = 100;
            record.error = Some(message);
            record.finished_at = Some(Instant::now());
        })
        .await;
    }

    async fn update(&self, scan_id: &str, mutate: impl FnOnce(&mut ScanRecord)) {
        if let Some(record) = self.records.write().await.get_mut(scan_id) {
            mutate(record);
        }
    }

    /// Periodically drop terminal records older than `ttl`. Runs for the
    /// process lifetime; scans still in flight are never evicted.
    pub fn spawn_sweeper(&self, ttl: Duration) {
        let store = self.clone();
        let period = ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                store.evict_older_than(ttl).await;
            }
        });
    }

    pub async fn evict_older_than(&self, ttl: Duration) {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| {
            record
                .finished_at
                .is_none_or(|finished| finished.elapsed() <= ttl)
        });
        let evicted = before - records.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired scan records");
        }
    }
}
