//! Image reference scanning, naming and link rewriting.
//!
//! A Yuque export embeds images as
//! `![image.png](https://cdn.nlark.com/yuque/<path>/<file>.png#<fragment>)`.
//! This pass walks the normalized line sequence once, and for every such line
//! derives a deterministic local name, downloads the bytes (unless already
//! present), normalizes the format, and rewrites the line to a relative link.
//!
//! Names are positional (`<asciiStem>-<lineIndex><ext>`), not content
//! addressed: the same URL at two different line indices yields two files.
//! That makes naming independent of the remote bytes and keeps re-runs
//! deterministic, at the cost of stale files when a document is re-edited
//! (documented limitation; nothing here garbage-collects the image dir).
//!
//! The pass reads one sequence and appends to a fresh one; indices used for
//! naming are indices into the *input* sequence, so the isolating blank lines
//! it inserts can never shift a name.

use crate::classify::{Classifier, LineKind};
use crate::config::NormalizeConfig;
use crate::error::Yuque2MdError;
use crate::pipeline::{convert, fetch};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// A markdown image tag at the start of a line: alt text and target.
static RE_IMAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)\s]+)\)").unwrap());

/// A CDN image URL: scheme, anything, a recognized raster/vector extension,
/// then an optional `#fragment` or `?query` that is ignored for both the
/// download URL and the extension.
static RE_CDN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://\S+?\.(jpeg|jpg|gif|png|svg|webp))(?:[#?]\S*)?$").unwrap()
});

/// An image reference extracted from one line.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageReference {
    /// Original alt text (informational; the rewrite uses the local name).
    pub alt: String,
    /// Download URL with any fragment/query stripped.
    pub url: String,
    /// Lowercased extension without the dot.
    pub ext: String,
}

/// Counters for one document's image pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageStats {
    pub found: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Match a line against the CDN image shape.
///
/// The line must *begin* with an image tag and its URL must contain
/// `cdn_marker` and end in a recognized image extension.
pub fn scan_line(line: &str, cdn_marker: &str) -> Option<ImageReference> {
    let caps = RE_IMAGE_TAG.captures(line)?;
    let target = caps.get(2)?.as_str();
    if !target.contains(cdn_marker) {
        return None;
    }
    let url_caps = RE_CDN_URL.captures(target)?;
    Some(ImageReference {
        alt: caps.get(1)?.as_str().to_string(),
        url: url_caps.get(1)?.as_str().to_string(),
        ext: url_caps.get(2)?.as_str().to_ascii_lowercase(),
    })
}

/// Romanize a document stem for use in image filenames.
///
/// Transliterates to phonetic ASCII and strips everything non-alphanumeric;
/// falls back to the raw stem minus spaces when transliteration is disabled
/// or yields nothing.
pub fn ascii_stem(stem: &str, transliterate: bool) -> String {
    if transliterate {
        let romanized: String = deunicode::deunicode(stem)
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        if !romanized.is_empty() {
            return romanized;
        }
    }
    stem.chars().filter(|c| *c != ' ').collect()
}

/// `![<name>](./<image_dir>/<name>)`
fn rewrite_line(image_dir: &str, name: &str) -> String {
    format!("![{name}](./{image_dir}/{name})")
}

/// Run the image externalization pass over a document's lines.
///
/// Returns the rewritten line sequence plus per-image counters. Only
/// directory-creation failures are fatal; everything per-image is logged and
/// skipped.
pub async fn externalize_images(
    lines: Vec<String>,
    doc_path: &Path,
    config: &NormalizeConfig,
    client: &reqwest::Client,
) -> Result<(Vec<String>, ImageStats), Yuque2MdError> {
    let doc_dir = doc_path.parent().unwrap_or_else(|| Path::new("."));
    let image_dir_path = doc_dir.join(&config.image_dir);
    let stem = doc_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = ascii_stem(&stem, config.transliterate);

    let mut classifier = Classifier::new();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut stats = ImageStats::default();

    for (idx, line) in lines.iter().enumerate() {
        let kind = classifier.classify(line);
        // Fence and front-matter interiors (and their delimiters) are never
        // image-rewritten.
        if matches!(
            kind,
            LineKind::Opaque | LineKind::Fence | LineKind::FrontMatter
        ) {
            out.push(line.clone());
            continue;
        }

        let Some(image) = scan_line(line, &config.cdn_marker) else {
            out.push(line.clone());
            continue;
        };
        stats.found += 1;
        debug!("Found image line {}: {} (alt '{}')", idx, image.url, image.alt);

        let final_ext = if config.convert_to_png {
            "png"
        } else {
            image.ext.as_str()
        };
        let expected_name = format!("{stem}-{idx}.{final_ext}");

        // The existing file is authoritative: re-runs never re-fetch.
        let final_name = if image_dir_path.join(&expected_name).exists() {
            debug!("Image {} already exists, skipping download", expected_name);
            stats.skipped += 1;
            expected_name
        } else {
            tokio::fs::create_dir_all(&image_dir_path)
                .await
                .map_err(|e| Yuque2MdError::DocumentWrite {
                    path: image_dir_path.clone(),
                    source: e,
                })?;

            let download_name = format!("{stem}-{idx}.{}", image.ext);
            let download_path = image_dir_path.join(&download_name);
            info!(
                "Downloading image {} to {}",
                image.url,
                download_path.display()
            );

            if let Err(e) = fetch::fetch(client, &image.url, &download_path).await {
                warn!("Skipping image at line {}: {}", idx, e);
                stats.failed += 1;
                out.push(line.clone());
                continue;
            }
            stats.downloaded += 1;

            if config.convert_to_png {
                match convert::normalize_to_png(&download_path) {
                    Ok(converted) => converted
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or(download_name),
                    Err(e) => {
                        // Keep the unconverted file and its name.
                        error!("Image conversion failed, keeping original: {}", e);
                        download_name
                    }
                }
            } else {
                download_name
            }
        };

        out.push(rewrite_line(&config.image_dir, &final_name));
        // Image lines stay visually isolated.
        if lines.get(idx + 1).is_some_and(|next| !next.trim().is_empty()) {
            out.push(String::new());
        }
    }

    Ok((out, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_cdn_image_with_fragment() {
        let r = scan_line(
            "![pic](https://cdn.example.com/yuque/abc/xyz.png#123)",
            "yuque",
        )
        .unwrap();
        assert_eq!(r.alt, "pic");
        assert_eq!(r.url, "https://cdn.example.com/yuque/abc/xyz.png");
        assert_eq!(r.ext, "png");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let r = scan_line("![p](https://cdn.x.com/yuque/a/b.WEBP)", "yuque").unwrap();
        assert_eq!(r.ext, "webp");
        assert_eq!(r.url, "https://cdn.x.com/yuque/a/b.WEBP");
    }

    #[test]
    fn rejects_foreign_host() {
        assert!(scan_line("![p](https://imgur.com/a/b.png)", "yuque").is_none());
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(scan_line("![p](https://cdn.x.com/yuque/a/b.tiff)", "yuque").is_none());
    }

    #[test]
    fn rejects_mid_line_image() {
        assert!(scan_line("see ![p](https://cdn.x.com/yuque/a/b.png)", "yuque").is_none());
    }

    #[test]
    fn rejects_plain_link() {
        assert!(scan_line("[p](https://cdn.x.com/yuque/a/b.png)", "yuque").is_none());
    }

    #[test]
    fn stem_transliterates_cjk() {
        let s = ascii_stem("笔记 2024", true);
        assert!(s.is_ascii(), "got: {s}");
        assert!(!s.contains(' '));
        assert!(s.ends_with("2024"));
    }

    #[test]
    fn stem_fallback_strips_spaces_only() {
        assert_eq!(ascii_stem("my notes", false), "mynotes");
    }

    #[test]
    fn rewrite_format() {
        assert_eq!(
            rewrite_line("_images", "notes-5.png"),
            "![notes-5.png](./_images/notes-5.png)"
        );
    }

    #[tokio::test]
    async fn existing_file_is_skipped_and_line_still_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("notes.md");
        let image_dir = dir.path().join("_images");
        std::fs::create_dir(&image_dir).unwrap();
        std::fs::write(image_dir.join("notes-5.png"), b"cached").unwrap();

        let mut lines: Vec<String> = (0..5).map(|i| format!("para {i}")).collect();
        lines.push("![pic](https://cdn.example.com/yuque/abc/xyz.png#123)".to_string());
        lines.push("tail".to_string());

        let config = NormalizeConfig::default();
        let client = reqwest::Client::new();
        let (out, stats) = externalize_images(lines, &doc, &config, &client)
            .await
            .unwrap();

        assert_eq!(stats.found, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.downloaded, 0);
        assert_eq!(out[5], "![notes-5.png](./_images/notes-5.png)");
        assert_eq!(out[6], "", "image line must be followed by a blank");
        assert_eq!(out[7], "tail");
    }

    #[tokio::test]
    async fn fenced_image_lines_are_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("notes.md");
        let raw = "![pic](https://cdn.example.com/yuque/abc/xyz.png)";
        let lines: Vec<String> = ["```", raw, "```"].iter().map(|s| s.to_string()).collect();

        let config = NormalizeConfig::default();
        let client = reqwest::Client::new();
        let (out, stats) = externalize_images(lines, &doc, &config, &client)
            .await
            .unwrap();

        assert_eq!(stats.found, 0);
        assert_eq!(out[1], raw);
    }
}
