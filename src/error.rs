//! Error types for the yuque2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Yuque2MdError`]: **Fatal**. Processing of a document (or the whole
//!   run) cannot proceed (missing input directory, unreadable file, failed
//!   final write). Returned as `Err(Yuque2MdError)` from the top-level
//!   `process_*` functions.
//!
//! * [`ImageError`]: **Non-fatal**. A single image reference failed (404,
//!   transport error, undecodable bytes). The markdown line is left
//!   unmodified, the failure is counted in [`crate::report::DocumentReport`],
//!   and the rest of the document is processed normally.
//!
//! The separation lets callers decide their own tolerance: abort a batch on
//! the first document failure, or log and continue (the CLI default).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the yuque2md library.
///
/// Per-image failures use [`ImageError`] and are recorded in
/// [`crate::report::DocumentReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Yuque2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input directory was not found.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// The input path exists but is not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    // ── Document I/O errors ───────────────────────────────────────────────
    /// Could not read a markdown document.
    #[error("Failed to read document '{path}': {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a document back (or create its image directory).
    #[error("Failed to write document '{path}': {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// Backup of the input tree failed before any rewriting started.
    #[error("Failed to back up '{path}': {detail}")]
    BackupFailed { path: PathBuf, detail: String },

    /// The pandoc binary could not be located on PATH.
    #[error("pandoc not found on PATH.\nInstall it (https://pandoc.org/installing.html) or drop --docx-dir.")]
    PandocNotFound,

    /// pandoc ran but exited non-zero for a document.
    #[error("pandoc failed for '{path}': {detail}")]
    PandocFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image reference.
///
/// Counted in [`crate::report::DocumentReport::images_failed`]; the
/// original markdown line stays untouched so the remote reference is never
/// lost.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Remote server answered with a non-success status.
    #[error("HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    /// Transport-level failure (DNS, TLS, timeout, connection refused).
    #[error("Request failed for '{url}': {reason}")]
    Request { url: String, reason: String },

    /// Could not persist the downloaded bytes.
    #[error("Failed to write image '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Downloaded bytes could not be decoded as a raster image.
    #[error("Failed to decode image '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// SVG could not be parsed or rendered.
    #[error("Failed to rasterize SVG '{path}': {detail}")]
    Rasterize { path: PathBuf, detail: String },

    /// Re-encoding the normalized PNG failed.
    #[error("Failed to encode PNG '{path}': {detail}")]
    Encode { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let e = ImageError::Status {
            url: "https://cdn.nlark.com/yuque/a/b.png".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("b.png"));
    }

    #[test]
    fn input_dir_display() {
        let e = Yuque2MdError::InputDirNotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert!(e.to_string().contains("/no/such/dir"));
    }

    #[test]
    fn pandoc_not_found_hint() {
        let e = Yuque2MdError::PandocNotFound;
        assert!(e.to_string().contains("PATH"));
    }
}
