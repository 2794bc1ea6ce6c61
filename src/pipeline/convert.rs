//! Image format normalization: everything becomes an opaque PNG.
//!
//! ## Why normalize at all?
//!
//! Yuque's CDN serves a mix of png, jpeg, gif, webp and svg; downstream
//! document converters (pandoc → Word in particular) choke on svg and render
//! transparent regions as black. Normalizing on download means the rewritten
//! markdown only ever references a format every consumer handles.
//!
//! The pre-conversion file is deleted on success so exactly one file per
//! reference remains. On any failure the caller falls back to the original
//! file and name; a bad image is a logged nuisance, not a pipeline abort.

use crate::error::ImageError;
use resvg::{tiny_skia, usvg};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Normalize the image at `path` to PNG, returning the path of the file that
/// ultimately exists on disk.
///
/// * `.svg` → rasterized to `.png` at its intrinsic size, vector file removed.
/// * `.png` → returned untouched.
/// * other rasters → decoded; an alpha channel is flattened onto opaque
///   white; re-encoded as `.png`; the original file removed.
pub fn normalize_to_png(path: &Path) -> Result<PathBuf, ImageError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "svg" {
        return rasterize_svg(path);
    }
    if ext == "png" {
        return Ok(path.to_path_buf());
    }

    let img = image::open(path).map_err(|e| ImageError::Decode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let png_path = path.with_extension("png");
    if img.color().has_alpha() {
        flatten_onto_white(&img)
            .save(&png_path)
            .map_err(|e| ImageError::Encode {
                path: png_path.clone(),
                detail: e.to_string(),
            })?;
    } else {
        img.to_rgb8()
            .save(&png_path)
            .map_err(|e| ImageError::Encode {
                path: png_path.clone(),
                detail: e.to_string(),
            })?;
    }

    remove_original(path)?;
    debug!("Converted {} to {}", path.display(), png_path.display());
    Ok(png_path)
}

/// Alpha-blend the image onto an opaque white background.
fn flatten_onto_white(img: &image::DynamicImage) -> image::RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut canvas = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, &rgba, 0, 0);
    image::DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Render an SVG to a PNG of its intrinsic size and remove the vector file.
fn rasterize_svg(path: &Path) -> Result<PathBuf, ImageError> {
    let rasterize_err = |detail: String| ImageError::Rasterize {
        path: path.to_path_buf(),
        detail,
    };

    let data = std::fs::read(path).map_err(|e| rasterize_err(e.to_string()))?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| rasterize_err(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width().max(1), size.height().max(1))
        .ok_or_else(|| rasterize_err("zero-sized pixmap".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let png_path = path.with_extension("png");
    pixmap
        .save_png(&png_path)
        .map_err(|e| ImageError::Encode {
            path: png_path.clone(),
            detail: e.to_string(),
        })?;

    remove_original(path)?;
    debug!("Rasterized {} to {}", path.display(), png_path.display());
    Ok(png_path)
}

fn remove_original(path: &Path) -> Result<(), ImageError> {
    std::fs::remove_file(path).map_err(|e| ImageError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
