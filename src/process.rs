//! Document pipeline: load → normalize → externalize images → write back.
//!
//! Processing is strictly sequential: one document is fully normalized and
//! rewritten before the next begins, and within a document lines flow through
//! a single forward pass per stage. There is nothing to lock; no two
//! operations ever touch the same document.
//!
//! The final write is atomic (temp file + rename in the same directory), so
//! an interruption can never leave a source document half-written.

use crate::config::NormalizeConfig;
use crate::error::Yuque2MdError;
use crate::normalize::normalize;
use crate::pipeline::externalize_images;
use crate::pipeline::fetch::http_client;
use crate::report::{DocumentReport, RunReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Recursively find all `.md` files under `root`, sorted for deterministic
/// processing order.
pub fn find_markdown_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "md")
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Validate that `root` exists and is a directory.
pub fn validate_input_dir(root: &Path) -> Result<(), Yuque2MdError> {
    if !root.exists() {
        return Err(Yuque2MdError::InputDirNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(Yuque2MdError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Process a single markdown document in place.
///
/// A document with zero lines or zero matching images is a valid no-op
/// pass-through. Per-image failures are counted in the returned
/// [`DocumentReport`]; only I/O on the document itself is fatal.
pub async fn process_file(
    path: &Path,
    config: &NormalizeConfig,
    client: &reqwest::Client,
) -> Result<DocumentReport, Yuque2MdError> {
    let start = Instant::now();
    debug!("Processing document {}", path.display());

    // ── Step 1: Load ─────────────────────────────────────────────────────
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Yuque2MdError::DocumentRead {
                path: path.to_path_buf(),
                source: e,
            })?;
    let lines: Vec<String> = content.lines().map(String::from).collect();
    let lines_in = lines.len();

    // ── Step 2: Blank-line normalization ─────────────────────────────────
    let normalized = normalize(&lines);
    if let Some(region) = normalized.unterminated {
        warn!(
            "{}: unterminated {} block; remainder passed through unmodified",
            path.display(),
            region
        );
    }
    let unterminated = normalized.unterminated;

    // ── Step 3: Image externalization over the re-indexed result ─────────
    let (out_lines, image_stats) =
        externalize_images(normalized.lines, path, config, client).await?;

    // ── Step 4: Atomic write back ────────────────────────────────────────
    let body = if out_lines.is_empty() {
        String::new()
    } else {
        let mut b = out_lines.join("\n");
        b.push('\n');
        b
    };
    write_atomic(path, &body).await?;

    Ok(DocumentReport {
        lines_in,
        lines_out: out_lines.len(),
        images_found: image_stats.found,
        images_downloaded: image_stats.downloaded,
        images_skipped: image_stats.skipped,
        images_failed: image_stats.failed,
        unterminated,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Write `body` to `path` via a temp file + rename in the same directory.
async fn write_atomic(path: &Path, body: &str) -> Result<(), Yuque2MdError> {
    let write_err = |e: std::io::Error| Yuque2MdError::DocumentWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, body).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

/// Process every markdown document under `root`, sequentially.
///
/// A per-document fatal error is recorded in the [`RunReport`] and the batch
/// continues with the next document; only configuration-level failures (bad
/// input directory, unbuildable HTTP client) abort before anything is
/// touched.
pub async fn process_dir(
    root: &Path,
    config: &NormalizeConfig,
) -> Result<RunReport, Yuque2MdError> {
    validate_input_dir(root)?;
    let client = http_client(config.download_timeout_secs)?;

    let files = find_markdown_files(root);
    info!("Found {} markdown files under {}", files.len(), root.display());

    let start = Instant::now();
    let mut run = RunReport::new();
    for file in files {
        match process_file(&file, config, &client).await {
            Ok(report) => {
                info!(
                    "Processed {} ({} images, {}ms)",
                    file.display(),
                    report.images_found,
                    report.duration_ms
                );
                run.push_ok(file, report);
            }
            Err(e) => {
                warn!("Failed to process {}: {}", file.display(), e);
                run.push_err(file, e.to_string());
            }
        }
    }
    run.stats.total_duration_ms = start.elapsed().as_millis() as u64;

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.md"), "x").unwrap();
        std::fs::write(dir.path().join("sub/a.md"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = find_markdown_files(dir.path());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name().unwrap(), "b.md");
        assert_eq!(files[1].file_name().unwrap(), "a.md");
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        let err = validate_input_dir(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, Yuque2MdError::InputDirNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("empty.md");
        std::fs::write(&doc, "").unwrap();

        let config = NormalizeConfig::default();
        let client = reqwest::Client::new();
        let report = process_file(&doc, &config, &client).await.unwrap();

        assert_eq!(report.lines_in, 0);
        assert_eq!(report.lines_out, 0);
        assert_eq!(report.images_found, 0);
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "");
    }

    #[tokio::test]
    async fn normalization_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.md");
        std::fs::write(&doc, "intro\n# Title\nbody\n").unwrap();

        let config = NormalizeConfig::default();
        let client = reqwest::Client::new();
        process_file(&doc, &config, &client).await.unwrap();

        let written = std::fs::read_to_string(&doc).unwrap();
        assert_eq!(written, "intro\n\n# Title\n\nbody\n");
        assert!(!doc.with_extension("md.tmp").exists());
    }

    #[tokio::test]
    async fn batch_continues_past_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.md"), "text\n").unwrap();
        // Invalid UTF-8 makes read_to_string fail for this document only.
        std::fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0xfd]).unwrap();

        let config = NormalizeConfig::default();
        let run = process_dir(dir.path(), &config).await.unwrap();

        assert_eq!(run.stats.documents_total, 2);
        assert_eq!(run.stats.documents_processed, 1);
        assert_eq!(run.stats.documents_failed, 1);
    }
}
