//! Document conversion collaborator: normalized markdown → Word via pandoc.
//!
//! The core's contract to this module is simple: after normalization, every
//! image reference in a document resolves as a local relative path from the
//! document's own directory. pandoc is therefore invoked with the markdown
//! file's directory as its working directory, so `./_images/...` links
//! resolve without any path rewriting.
//!
//! pandoc is an opaque external binary; everything about the actual format
//! conversion is its problem, not ours.

use crate::error::Yuque2MdError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locate the pandoc binary on PATH.
pub fn locate_pandoc() -> Result<PathBuf, Yuque2MdError> {
    which::which("pandoc").map_err(|_| Yuque2MdError::PandocNotFound)
}

/// Convert one normalized markdown file to a `.docx` at `output_path`.
///
/// Parent directories of `output_path` are created as needed.
pub async fn convert_to_docx(
    pandoc: &Path,
    md_path: &Path,
    output_path: &Path,
) -> Result<(), Yuque2MdError> {
    let internal = |detail: String| Yuque2MdError::Internal(detail);

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Yuque2MdError::DocumentWrite {
                path: output_path.to_path_buf(),
                source: e,
            })?;
    }

    let workdir = md_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = md_path
        .file_name()
        .ok_or_else(|| internal(format!("no file name in '{}'", md_path.display())))?;
    // pandoc runs from the markdown file's directory; the output path must
    // stay valid from there.
    let output_abs = std::path::absolute(output_path)
        .map_err(|e| internal(format!("cannot absolutize output path: {e}")))?;

    info!(
        "Converting {} to Word document {}",
        md_path.display(),
        output_abs.display()
    );
    let output = tokio::process::Command::new(pandoc)
        .current_dir(workdir)
        .arg(file_name)
        .arg("-o")
        .arg(&output_abs)
        .output()
        .await
        .map_err(|e| internal(format!("failed to spawn pandoc: {e}")))?;

    if !output.status.success() {
        return Err(Yuque2MdError::PandocFailed {
            path: md_path.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    debug!("pandoc finished for {}", md_path.display());
    Ok(())
}

/// Compute the `.docx` output path for `md_path`, mirroring its position
/// under `root` into `out_dir`.
pub fn docx_output_path(root: &Path, md_path: &Path, out_dir: &Path) -> PathBuf {
    let rel = md_path.strip_prefix(root).unwrap_or(md_path);
    out_dir.join(rel).with_extension("docx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_mirrors_tree() {
        let out = docx_output_path(
            Path::new("/export"),
            Path::new("/export/book/ch1.md"),
            Path::new("/export.converted"),
        );
        assert_eq!(out, Path::new("/export.converted/book/ch1.docx"));
    }

    #[test]
    fn output_path_handles_foreign_prefix() {
        let out = docx_output_path(
            Path::new("/export"),
            Path::new("other/doc.md"),
            Path::new("/out"),
        );
        assert_eq!(out, Path::new("/out/other/doc.docx"));
    }
}
