//! Image externalization pipeline.
//!
//! ```text
//! normalized lines
//!  │
//!  ├─ 1. Scan     match CDN image lines, extract URL + alt  (images)
//!  ├─ 2. Name     <asciiStem>-<lineIndex><ext>              (images)
//!  ├─ 3. Fetch    HTTP GET → sibling image dir, skip-if-exists (fetch)
//!  ├─ 4. Convert  svg → png rasterize, alpha → white, re-encode (convert)
//!  └─ 5. Rewrite  ![name](./<dir>/name) + isolating blank   (images)
//! ```
//!
//! Every step is per-line and per-image: a failed fetch or conversion is a
//! recoverable [`crate::error::ImageError`] that leaves that one line (or
//! that one file) alone and moves on.

pub mod convert;
pub mod fetch;
pub mod images;

pub use images::{externalize_images, ImageStats};
