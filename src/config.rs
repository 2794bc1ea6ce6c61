//! Configuration types for markdown normalization.
//!
//! All pipeline behaviour is controlled through [`NormalizeConfig`], built
//! via its [`NormalizeConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share the config across a batch run, serialise it for
//! logging, and diff two runs to understand why their outputs differ.

use crate::error::Yuque2MdError;
use serde::{Deserialize, Serialize};

/// Configuration for a normalization run.
///
/// Built via [`NormalizeConfig::builder()`] or [`NormalizeConfig::default()`].
///
/// # Example
/// ```rust
/// use yuque2md::NormalizeConfig;
///
/// let config = NormalizeConfig::builder()
///     .image_dir("_assets")
///     .download_timeout_secs(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Name of the per-document image directory. Default: `_images`.
    ///
    /// Created lazily as a sibling of each markdown file, never as a single
    /// global directory. Rewritten links are relative (`./_images/...`) so
    /// the exported tree stays relocatable.
    pub image_dir: String,

    /// Substring that identifies the platform CDN in an image URL. Default: `yuque`.
    ///
    /// Yuque exports embed images as
    /// `![name](https://cdn.nlark.com/yuque/<path>/<file>.png#<fragment>)`.
    /// Only lines whose URL contains this marker are externalized; all other
    /// image links pass through untouched.
    pub cdn_marker: String,

    /// Transliterate non-ASCII document stems for local image names. Default: true.
    ///
    /// Yuque documents are routinely titled in Chinese. Romanizing the stem
    /// keeps image filenames portable across filesystems and downstream
    /// converters. When disabled (or when transliteration yields nothing),
    /// the raw stem minus spaces is used instead.
    pub transliterate: bool,

    /// Normalize every downloaded image to PNG. Default: true.
    ///
    /// SVGs are rasterized; rasters with an alpha channel are flattened onto
    /// an opaque white background. Downstream document converters (Word via
    /// pandoc in particular) handle a single opaque bitmap format far more
    /// reliably than the CDN's mix of webp/svg/transparent png.
    pub convert_to_png: bool,

    /// HTTP timeout per image download in seconds. Default: 30.
    pub download_timeout_secs: u64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            image_dir: "_images".to_string(),
            cdn_marker: "yuque".to_string(),
            transliterate: true,
            convert_to_png: true,
            download_timeout_secs: 30,
        }
    }
}

impl NormalizeConfig {
    /// Create a new builder for `NormalizeConfig`.
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`NormalizeConfig`].
#[derive(Debug)]
pub struct NormalizeConfigBuilder {
    config: NormalizeConfig,
}

impl NormalizeConfigBuilder {
    pub fn image_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.image_dir = dir.into();
        self
    }

    pub fn cdn_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.cdn_marker = marker.into();
        self
    }

    pub fn transliterate(mut self, v: bool) -> Self {
        self.config.transliterate = v;
        self
    }

    pub fn convert_to_png(mut self, v: bool) -> Self {
        self.config.convert_to_png = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<NormalizeConfig, Yuque2MdError> {
        let c = &self.config;
        if c.image_dir.is_empty() {
            return Err(Yuque2MdError::InvalidConfig(
                "image_dir must not be empty".into(),
            ));
        }
        if c.image_dir.contains('/') || c.image_dir.contains('\\') {
            return Err(Yuque2MdError::InvalidConfig(format!(
                "image_dir must be a plain directory name, got '{}'",
                c.image_dir
            )));
        }
        if c.cdn_marker.is_empty() {
            return Err(Yuque2MdError::InvalidConfig(
                "cdn_marker must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = NormalizeConfig::default();
        assert_eq!(c.image_dir, "_images");
        assert_eq!(c.cdn_marker, "yuque");
        assert!(c.transliterate);
        assert!(c.convert_to_png);
    }

    #[test]
    fn builder_rejects_nested_image_dir() {
        let err = NormalizeConfig::builder()
            .image_dir("a/b")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("plain directory name"));
    }

    #[test]
    fn builder_rejects_empty_marker() {
        assert!(NormalizeConfig::builder().cdn_marker("").build().is_err());
    }

    #[test]
    fn timeout_clamped_to_one() {
        let c = NormalizeConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.download_timeout_secs, 1);
    }
}
