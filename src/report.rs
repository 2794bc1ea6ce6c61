//! Run reporting: per-document and per-run statistics.
//!
//! Everything here is serde-serializable so the CLI can emit a machine-
//! readable run report with `--json`, and so two runs can be diffed to see
//! exactly which documents and images changed.

use crate::classify::Region;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Line count before normalization.
    pub lines_in: usize,
    /// Line count written back.
    pub lines_out: usize,
    /// CDN image references matched in the document.
    pub images_found: usize,
    /// Images fetched over HTTP this run.
    pub images_downloaded: usize,
    /// Images whose local file already existed (fetch skipped).
    pub images_skipped: usize,
    /// Images that failed to fetch or could not be written.
    pub images_failed: usize,
    /// Set when the document ended inside an unclosed fence or front-matter
    /// block; the remainder was passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unterminated: Option<Region>,
    /// Wall-clock time spent on this document.
    pub duration_ms: u64,
}

/// One document's slot in a batch run: either a report or the error that
/// stopped it. Per-document failures never abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DocumentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counters for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub documents_total: usize,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub images_found: usize,
    pub images_downloaded: usize,
    pub images_skipped: usize,
    pub images_failed: usize,
    pub total_duration_ms: u64,
}

/// Full result of a batch run over an input tree.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub documents: Vec<DocumentOutcome>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Record a successfully processed document.
    pub fn push_ok(&mut self, path: PathBuf, report: DocumentReport) {
        self.stats.documents_total += 1;
        self.stats.documents_processed += 1;
        self.stats.images_found += report.images_found;
        self.stats.images_downloaded += report.images_downloaded;
        self.stats.images_skipped += report.images_skipped;
        self.stats.images_failed += report.images_failed;
        self.documents.push(DocumentOutcome {
            path,
            report: Some(report),
            error: None,
        });
    }

    /// Record a document that failed fatally; the batch continues.
    pub fn push_err(&mut self, path: PathBuf, error: String) {
        self.stats.documents_total += 1;
        self.stats.documents_failed += 1;
        self.documents.push(DocumentOutcome {
            path,
            report: None,
            error: Some(error),
        });
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> DocumentReport {
        DocumentReport {
            lines_in: 10,
            lines_out: 14,
            images_found: 2,
            images_downloaded: 1,
            images_skipped: 1,
            images_failed: 0,
            unterminated: None,
            duration_ms: 3,
        }
    }

    #[test]
    fn aggregation() {
        let mut run = RunReport::new();
        run.push_ok(PathBuf::from("a.md"), sample_report());
        run.push_err(PathBuf::from("b.md"), "boom".into());
        assert_eq!(run.stats.documents_total, 2);
        assert_eq!(run.stats.documents_processed, 1);
        assert_eq!(run.stats.documents_failed, 1);
        assert_eq!(run.stats.images_found, 2);
        assert_eq!(run.stats.images_downloaded, 1);
    }

    #[test]
    fn json_omits_absent_fields() {
        let mut run = RunReport::new();
        run.push_ok(PathBuf::from("a.md"), sample_report());
        let json = serde_json::to_string(&run).unwrap();
        assert!(!json.contains("unterminated"));
        assert!(!json.contains("\"error\""));
    }
}
