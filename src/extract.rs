//! Content extraction: one PDF in, one Markdown file plus images out.
//!
//! ```text
//! {output_dir}/{stem}.md
//! {output_dir}/images/{stem}/image_000.png
//! {output_dir}/images/{stem}/image_001.png
//! ```
//!
//! Image links inside the Markdown are relative to `output_dir`, so the
//! directory can be moved as a whole.

use crate::error::CurateError;
use crate::output::ExtractionOutput;
use crate::pipeline::convert::DocumentConverter;
use crate::pipeline::images::{
    count_formula_placeholders, count_image_placeholders, extract_images, splice_images,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Converts PDFs and writes the results under one output directory.
pub struct ContentExtractor {
    converter: Arc<dyn DocumentConverter>,
    output_dir: PathBuf,
    skip_decorative: bool,
}

impl ContentExtractor {
    pub fn new(converter: Arc<dyn DocumentConverter>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
            skip_decorative: false,
        }
    }

    /// Drop decorative pictures when extracting image files. Must match the
    /// converter's picture classification so placeholders stay aligned.
    pub fn skip_decorative(mut self, skip: bool) -> Self {
        self.skip_decorative = skip;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert `pdf_path`, extract its images, splice the links in and write
    /// `{output_dir}/{stem}.md`.
    pub async fn extract(&self, pdf_path: &Path) -> Result<ExtractionOutput, CurateError> {
        let start = Instant::now();
        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| CurateError::InvalidPath {
                path: pdf_path.to_path_buf(),
            })?;

        let markdown = self.converter.convert(pdf_path).await?;

        let image_dir = self.output_dir.join("images").join(&stem);
        let image_paths = extract_images(pdf_path, &image_dir, self.skip_decorative).await;
        let content = splice_images(&markdown, &image_paths);
        let formula_count = count_formula_placeholders(&content);
        let unmatched_images = count_image_placeholders(&content);
        if unmatched_images > 0 {
            warn!(
                "{}: {} image placeholders had no extracted picture",
                pdf_path.display(),
                unmatched_images
            );
        }

        let markdown_path = self.output_dir.join(format!("{stem}.md"));
        write_atomic(&markdown_path, &content).await?;

        let extraction_time = (start.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            "Extracted {} → {} ({} images, {} formulas, {:.2}s)",
            pdf_path.display(),
            markdown_path.display(),
            image_paths.len(),
            formula_count,
            extraction_time
        );

        Ok(ExtractionOutput {
            content,
            markdown_path,
            image_count: image_paths.len(),
            formula_count,
            unmatched_images,
            image_paths,
            extraction_time,
        })
    }
}

/// Write to `{path}.tmp` and rename into place.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), CurateError> {
    let write_err = |source| CurateError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}
