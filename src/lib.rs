//! # yuque2md
//!
//! Normalize markdown exported from Yuque and externalize its CDN images.
//!
//! ## Why this crate?
//!
//! Yuque's markdown export is written for Yuque's own renderer: headings and
//! code fences sit flush against surrounding text, paragraphs are packed one
//! per line, and every image points at the platform CDN
//! (`https://cdn.nlark.com/yuque/...`) behind an expiring URL. Feed that to a
//! strict Markdown consumer (pandoc, a static site generator, plain git
//! hosting) and blocks merge, fences swallow text, and images 404 once the
//! export leaves Yuque. This crate rewrites each document in place into
//! portable Markdown with locally stored, PNG-normalized images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document.md
//!  │
//!  ├─ 1. Load       read all lines into memory
//!  ├─ 2. Classify   tag each line (heading / list / fence / opaque / …)
//!  ├─ 3. Normalize  insert required blank lines, collapse blank runs
//!  ├─ 4. Images     scan CDN refs → fetch → convert to PNG → rewrite links
//!  └─ 5. Persist    atomic write back over the original file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use yuque2md::{process_dir, NormalizeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NormalizeConfig::default();
//!     let run = process_dir("./yuque-export".as_ref(), &config).await?;
//!     println!(
//!         "{} documents, {} images downloaded, {} failed",
//!         run.stats.documents_processed,
//!         run.stats.images_downloaded,
//!         run.stats.images_failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! * Re-running over an already-processed tree is a no-op for images: local
//!   files are authoritative and are never re-fetched.
//! * Fence and front-matter interiors are preserved byte-for-byte.
//! * A dead image link or a broken image file never fails a document; a
//!   broken document never fails the batch.
//! * Document writes are atomic (temp file + rename).
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `yuque2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backup;
pub mod classify;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pandoc;
pub mod pipeline;
pub mod process;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backup::backup_tree;
pub use classify::{Classifier, LineKind, Region};
pub use config::{NormalizeConfig, NormalizeConfigBuilder};
pub use error::{ImageError, Yuque2MdError};
pub use normalize::{normalize, Normalized};
pub use pipeline::fetch::http_client;
pub use pipeline::{externalize_images, ImageStats};
pub use process::{find_markdown_files, process_dir, process_file, validate_input_dir};
pub use report::{DocumentOutcome, DocumentReport, RunReport, RunStats};
