//! Processing stages for one paper.
//!
//! ```text
//! PDF ──▶ convert ──▶ images ──▶ structure ──▶ metadata ──▶ quality
//!         (pdfium,     (extract,   (features)    (ids, type)  (score)
//!          ocr)         splice)
//!                                             └──▶ chunk
//! ```
//!
//! 1. [`convert`] turns the PDF into Markdown through the [`convert::DocumentConverter`]
//!    seam. The pdfium implementation falls back to [`ocr`] for scanned pages
//!    and finishes with [`postprocess`].
//! 2. [`images`] writes embedded pictures to disk and splices links into the
//!    placeholders the converter left.
//! 3. [`structure`], [`metadata`] and [`quality`] are pure functions over the
//!    Markdown text.
//! 4. [`chunk`] splits text for retrieval indexing.
//!
//! Every pdfium call blocks and runs inside `spawn_blocking`; [`pdfium`]
//! holds the shared binding and loading code.

pub mod chunk;
pub mod convert;
pub mod images;
pub mod metadata;
pub mod ocr;
pub mod pdfium;
pub mod postprocess;
pub mod quality;
pub mod structure;
