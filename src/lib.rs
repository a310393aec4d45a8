//! # paper-curator
//!
//! Build a local research-paper collection: download a reading list of
//! papers into category folders, then turn each PDF into Markdown with
//! extracted figures, structural metadata and a quality score, optionally
//! split into chunks for retrieval.
//!
//! ## Pipeline Overview
//!
//! ```text
//! catalog ──▶ fetch ──▶ papers/{category}/{year}_{name}.pdf
//!                                   │
//!            ┌──────────────────────┘
//!            ▼
//!  1. Convert   pdfium text layer, OCR for scanned pages
//!  2. Images    extract embedded pictures, splice links into placeholders
//!  3. Analyze   abstract / references / tables / figures / counts
//!  4. Metadata  ids, hashes, year, category, document type
//!  5. Score     weighted completeness heuristic in [0, 1]
//!  6. Chunk     overlapping character-budget chunks
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_curator::{catalog, DocumentProcessor, FetchConfig, Fetcher, ProcessorConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Fetcher::new(FetchConfig::default())?;
//!     let summary = fetcher.download_all(&catalog::builtin(), Path::new("papers")).await;
//!     eprintln!("{} downloaded, {} failed", summary.success, summary.failed);
//!
//!     let config = ProcessorConfig::builder().output_dir("processed").build()?;
//!     let mut processor = DocumentProcessor::new(config)?;
//!     let result = processor
//!         .process_document(Path::new("papers/03_language_models/2018_BERT.pdf"))
//!         .await;
//!     if let Some(meta) = result.metadata {
//!         println!("{} scored {:.2}", meta.title, meta.quality_score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paper-curator` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## Runtime requirements
//!
//! PDF conversion binds to a pdfium shared library at runtime
//! (`PDFIUM_LIB_PATH`, else the system library path). OCR of scanned pages
//! needs a vision-capable LLM provider configured through `edgequake-llm`
//! (for example `OPENAI_API_KEY`); without one, scanned pages are kept as
//! picture placeholders only.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{PaperRecord, PaperSource};
pub use config::{ConverterOptions, FetchConfig, OcrConfig, ProcessorConfig};
pub use error::CurateError;
pub use extract::ContentExtractor;
pub use fetch::{FetchOutcome, FetchStatus, FetchSummary, Fetcher, SkipReason};
pub use output::{
    Chunk, DocumentMetadata, DocumentType, ExtractionOutput, ProcessingResult, ResultRow,
    StructureFeatures,
};
pub use pipeline::convert::{DocumentConverter, PdfiumConverter};
pub use processor::{DocumentProcessor, ProcessingStats, StatsSnapshot};

// Re-export edgequake-llm so callers can construct a provider for OCR
// without adding a separate dependency.
pub use edgequake_llm::{LLMProvider, ProviderFactory};
