//! Backup collaborator: copy the input tree aside before in-place rewriting.
//!
//! The pipeline overwrites source documents. Even with atomic per-file
//! writes, a run with wrong flags is destructive; the backup gives the user
//! a one-command undo. The backup lands at `<dir>.bak` next to the input
//! directory; a previous backup at that path is replaced.

use crate::error::Yuque2MdError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Copy `src` recursively to a `<src>.bak` sibling, replacing any previous
/// backup. Returns the backup path.
pub fn backup_tree(src: &Path) -> Result<PathBuf, Yuque2MdError> {
    let backup_err = |detail: String| Yuque2MdError::BackupFailed {
        path: src.to_path_buf(),
        detail,
    };

    let name = src
        .file_name()
        .ok_or_else(|| backup_err("input path has no final component".into()))?;
    let mut backup_name = name.to_os_string();
    backup_name.push(".bak");
    let dest = src
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(backup_name);

    if dest.exists() {
        warn!("Removing previous backup {}", dest.display());
        std::fs::remove_dir_all(&dest).map_err(|e| backup_err(e.to_string()))?;
    }

    info!("Backing up {} to {}", src.display(), dest.display());
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| backup_err(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| backup_err(e.to_string()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| backup_err(e.to_string()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| backup_err(e.to_string()))?;
        }
        // Symlinks are skipped; Yuque exports never contain them.
    }

    Ok(dest)
}
