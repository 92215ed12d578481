use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempPath;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::analyze::{javascript, manifest};
use crate::models::MANIFEST_FILE_NAME;
use crate::store::ScanStore;
use crate::unpack;

// Pacing between pipeline stages so pollers can observe intermediate
// progress. Ordering of the updates is the requirement, the pacing is not.
const STAGE_PACING: Duration = Duration::from_millis(250);

/// Tracks the per-scan background tasks so shutdown can drain them instead of
/// tearing the runtime down mid-scan.
#[derive(Clone, Default)]
pub struct Scheduler {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn spawn(&self, scan: impl Future<Output = ()> + Send + 'static) {
        let mut tasks = self.tasks.lock().await;
        // Reap already-finished tasks before adding another.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(scan);
    }

    /// Wait for every in-flight scan to finish.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}

/// One scan's background task: drives the record from `processing` to a
/// terminal state. The uploaded temp file is removed on every exit path when
/// `upload` drops at the end of the task.
pub async fn run_scan(store: ScanStore, scan_id: String, upload: TempPath) {
    store.begin(&scan_id).await;
    match analyze_upload(&store, &scan_id, upload.to_path_buf()).await {
        Ok(()) => tracing::info!(%scan_id, "scan completed"),
        Err(err) => {
            tracing::warn!(%scan_id, error = %err, "scan failed");
            store.fail(&scan_id, format!("{err:#}")).await;
        }
    }
}

async fn analyze_upload(store: &ScanStore, scan_id: &str, archive: PathBuf) -> Result<()> {
    store.set_progress(scan_id, 25).await;
    sleep(STAGE_PACING).await;

    let contents = tokio::task::spawn_blocking(move || unpack::extract_archive(&archive))
        .await
        .context("extraction task aborted")??;

    if let Some(manifest_text) = contents.manifest {
        let issues = manifest::analyze_manifest(&manifest_text);
        store
            .record_file(scan_id, MANIFEST_FILE_NAME, manifest_text)
            .await;
        store.append_issues(scan_id, issues).await;
    }

    store.set_progress(scan_id, 50).await;
    sleep(STAGE_PACING).await;

    for (name, text) in contents.scripts {
        let issues = javascript::analyze_javascript(&text, &name);
        store.record_file(scan_id, &name, text).await;
        store.append_issues(scan_id, issues).await;
    }

    store.set_progress(scan_id, 75).await;
    sleep(STAGE_PACING).await;

    store.finalize(scan_id).await;
    Ok(())
}
