use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::{Issue, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Uploaded,
    Processing,
    Completed,
    Error,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Error)
    }
}

/// Per-severity issue counts, derived once from a scan's full issue list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_issues: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub success: usize,
}

impl Summary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Summary::default();
        for issue in issues {
            summary.total_issues += 1;
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
                Severity::Success => summary.success += 1,
            }
        }
        summary
    }

    /// Weighted 0-100 score; info and success findings do not penalize.
    pub fn security_score(&self) -> u8 {
        let penalty = 25 * self.critical as i64
            + 15 * self.high as i64
            + 10 * self.medium as i64
            + 5 * self.low as i64;
        (100 - penalty).clamp(0, 100) as u8
    }
}

/// Everything known about one scan, from upload through its terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub filename: String,
    pub file_size: String,
    pub status: ScanStatus,
    pub progress: u8,
    pub timestamp: DateTime<Utc>,
    pub issues: Vec<Issue>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub file_contents: BTreeMap<String, String>,
    /// When the scan reached a terminal state; drives TTL eviction.
    #[serde(skip)]
    pub finished_at: Option<Instant>,
}

impl ScanRecord {
    pub fn new(scan_id: String, filename: String, size_bytes: usize) -> Self {
        Self {
            scan_id,
            filename,
            file_size: format!("{}KB", size_bytes / 1024),
            status: ScanStatus::Uploaded,
            progress: 0,
            timestamp: Utc::now(),
            issues: Vec::new(),
            summary: Summary::default(),
            security_score: None,
            error: None,
            file_contents: BTreeMap::new(),
            finished_at: None,
        }
    }
}
