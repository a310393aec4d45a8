//! Error types for the paper-curator library.
//!
//! A single [`CurateError`] covers every operation that can fail outright:
//! resolving and downloading a catalog entry, opening a PDF, converting it,
//! writing outputs. Two failure classes deliberately do *not* surface here:
//!
//! * An HTTP 403 during download is a soft skip, reported as
//!   [`crate::fetch::FetchOutcome::Skipped`].
//! * A single embedded image that cannot be decoded is logged and skipped
//!   by [`crate::pipeline::images::extract_images`].
//!
//! Inside a batch, [`crate::processor::DocumentProcessor::process_document`]
//! catches every `CurateError` and records its message on the
//! [`crate::output::ProcessingResult`], so one bad file never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the paper-curator library.
#[derive(Debug, Error)]
pub enum CurateError {
    // ── Catalog errors ────────────────────────────────────────────────────
    /// The catalog entry names neither an arXiv id nor a direct URL.
    #[error("Unknown source type for '{name}': expected an arXiv id or a direct PDF URL")]
    UnknownSourceType { name: String },

    /// A catalog file could not be read or parsed.
    #[error("Invalid catalog '{path}': {detail}")]
    InvalidCatalog { path: PathBuf, detail: String },

    // ── Network errors ────────────────────────────────────────────────────
    /// Server answered with a non-success status outside the retry set.
    #[error("HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// Connection, TLS, or body-read failure.
    #[error("Network error for '{url}': {reason}")]
    Network { url: String, reason: String },

    /// Every attempt hit a transient status or network error.
    #[error("Giving up on '{url}' after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The path has no usable file name (e.g. `..` or `/`).
    #[error("Path '{path}' has no file name")]
    InvalidPath { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// The conversion engine failed for a reason other than opening the file.
    #[error("Conversion failed for '{path}': {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// The text splitter rejected the chunk configuration.
    #[error("Chunking failed: {0}")]
    Chunking(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// No vision provider could be built for OCR.
    #[error("LLM provider '{provider}' is not configured: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A page could not be rasterised for transcription.
    #[error("Failed to render page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The vision model failed on a page after all retries.
    #[error("OCR failed on page {page} after {retries} retries: {detail}")]
    OcrFailed {
        page: usize,
        retries: u32,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create a directory or write an output file.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read file metadata or contents.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}
