//! pdfium binding and document loading.
//!
//! pdfium is a C++ library loaded at runtime. `PDFIUM_LIB_PATH` points at a
//! specific `libpdfium` file (useful when several copies are installed);
//! otherwise the platform's system library search path is used.
//!
//! Every function here blocks. Callers run them inside
//! `tokio::task::spawn_blocking`.

use crate::error::CurateError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library.
pub fn bind_pdfium() -> Result<Pdfium, CurateError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => {
            debug!("Binding pdfium from {}", path);
            Pdfium::bind_to_library(&path)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| CurateError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open `pdf_path` with an already-bound pdfium.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
) -> Result<PdfDocument<'a>, CurateError> {
    if !pdf_path.exists() {
        return Err(CurateError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| CurateError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Whether a decoded image is too small to be a figure.
///
/// Icons, bullets and rule lines are embedded as tiny rasters; anything
/// whose longest edge is under this many pixels is treated as decorative.
pub const DECORATIVE_MAX_EDGE_PX: u32 = 64;

pub fn is_decorative(width: u32, height: u32) -> bool {
    width.max(height) < DECORATIVE_MAX_EDGE_PX
}

/// Decoded pictures of one page, in content-stream order.
///
/// Both the converter (placeholders) and the image extractor (files) walk
/// pages through this function, so the n-th placeholder and the n-th
/// extracted file refer to the same picture. Undecodable images are
/// dropped from both.
pub fn page_figures(page: &PdfPage, page_num: usize, skip_decorative: bool) -> Vec<DynamicImage> {
    page.objects()
        .iter()
        .filter_map(|object| {
            let image_object = object.as_image_object()?;
            match image_object.get_raw_image() {
                Ok(img) => Some(img),
                Err(e) => {
                    debug!("Page {}: undecodable image skipped: {:?}", page_num, e);
                    None
                }
            }
        })
        .filter(|img| !(skip_decorative && is_decorative(img.width(), img.height())))
        .collect()
}
