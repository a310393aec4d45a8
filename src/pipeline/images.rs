//! Embedded-image extraction and placeholder splicing.
//!
//! The converter marks each picture with `<!-- image -->` but does not write
//! image files. [`extract_images`] pulls the embedded rasters out of the PDF
//! page by page and [`splice_images`] swaps the n-th placeholder for a link to
//! the n-th extracted file. The pairing is positional; it holds as long as
//! the converter and the extractor see pictures in the same document order.
//!
//! Extraction never fails the document: a picture that cannot be decoded is
//! skipped, and a missing pdfium library yields no images at all.

use crate::pipeline::pdfium::{bind_pdfium, open_document, page_figures};
use image::ImageFormat;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

static RE_IMAGE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*image\s*-->").unwrap());
static RE_FORMULA_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*formula[^>]*-->").unwrap());

/// Write every embedded raster image of `pdf_path` to
/// `output_dir/image_{NNN}.png` and return the paths relative to the
/// grandparent of `output_dir` (the processed-output root when
/// `output_dir` is `{root}/images/{stem}`).
///
/// When `skip_decorative` is set, images classified as decorative by
/// [`crate::pipeline::pdfium::is_decorative`] are not written and do not
/// consume a sequence number.
pub async fn extract_images(pdf_path: &Path, output_dir: &Path, skip_decorative: bool) -> Vec<String> {
    let pdf = pdf_path.to_path_buf();
    let out = output_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || extract_images_blocking(&pdf, &out, skip_decorative))
        .await
    {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Image extraction task failed: {}", e);
            Vec::new()
        }
    }
}

fn extract_images_blocking(pdf_path: &Path, output_dir: &Path, skip_decorative: bool) -> Vec<String> {
    let pdfium = match bind_pdfium() {
        Ok(p) => p,
        Err(e) => {
            warn!("Skipping image extraction: {}", e);
            return Vec::new();
        }
    };
    let document = match open_document(&pdfium, pdf_path) {
        Ok(d) => d,
        Err(e) => {
            warn!("Skipping image extraction: {}", e);
            return Vec::new();
        }
    };
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        warn!("Cannot create image directory {}: {}", output_dir.display(), e);
        return Vec::new();
    }

    let root: PathBuf = output_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut paths = Vec::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        for image in page_figures(&page, page_index + 1, skip_decorative) {
            let file_name = format!("image_{:03}.png", paths.len());
            let file_path = output_dir.join(&file_name);
            if let Err(e) = image.save_with_format(&file_path, ImageFormat::Png) {
                warn!("Failed to write {}: {}", file_path.display(), e);
                continue;
            }
            paths.push(relative_to(&file_path, &root));
        }
    }

    info!("Extracted {} images from {}", paths.len(), pdf_path.display());
    paths
}

/// `path` relative to `root`, joined with forward slashes.
fn relative_to(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace image placeholders one-for-one with Markdown image links.
///
/// Placeholders beyond `image_paths.len()` are left untouched.
pub fn splice_images(markdown: &str, image_paths: &[String]) -> String {
    let mut index = 0;
    RE_IMAGE_PLACEHOLDER
        .replace_all(markdown, |caps: &Captures| {
            let replacement = match image_paths.get(index) {
                Some(path) => format!("![Image {}]({})", index + 1, path),
                None => caps[0].to_string(),
            };
            index += 1;
            replacement
        })
        .into_owned()
}

pub fn count_image_placeholders(markdown: &str) -> usize {
    RE_IMAGE_PLACEHOLDER.find_iter(markdown).count()
}

/// Formula placeholders are counted but never replaced.
pub fn count_formula_placeholders(markdown: &str) -> usize {
    RE_FORMULA_PLACEHOLDER.find_iter(markdown).count()
}
