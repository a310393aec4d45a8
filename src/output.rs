//! Result types produced by the processing pipeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Coarse document genre, decided by [`crate::pipeline::metadata::detect_document_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ResearchPaper,
    TechnicalDoc,
    Report,
    Manual,
    Policy,
    General,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ResearchPaper => "research_paper",
            DocumentType::TechnicalDoc => "technical_doc",
            DocumentType::Report => "report",
            DocumentType::Manual => "manual",
            DocumentType::Policy => "policy",
            DocumentType::General => "general",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic structural features of a Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureFeatures {
    pub has_abstract: bool,
    pub has_references: bool,
    pub has_tables: bool,
    pub has_figures: bool,
    pub word_count: usize,
    pub char_count: usize,
    /// Number of `#` characters, used as a rough heading count.
    pub header_count: usize,
}

/// Per-document metadata record.
///
/// `quality_score` stays `0.0` until [`crate::pipeline::quality::assess_quality`]
/// has run on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// First 16 hex chars of the MD5 of the file name.
    pub document_id: String,
    pub filename: String,
    pub title: String,
    /// First 16 hex chars of the SHA-256 of the extracted text.
    pub content_hash: String,

    pub category: String,
    pub document_type: DocumentType,
    pub year: Option<i32>,

    pub word_count: usize,
    pub char_count: usize,
    /// Never populated.
    pub page_count: Option<usize>,

    pub has_abstract: bool,
    pub has_references: bool,
    pub has_tables: bool,
    pub has_figures: bool,

    pub quality_score: f64,
    pub extraction_confidence: f64,

    pub created_at: DateTime<Local>,
    pub processed_at: DateTime<Local>,

    pub keywords: Option<Vec<String>>,
    pub language: String,
    pub authors: Option<Vec<String>>,
}

/// Outcome of processing one document.
///
/// Exactly one of {`content` + `metadata`, `error`} is populated; use the
/// [`ProcessingResult::succeeded`] and [`ProcessingResult::failed`]
/// constructors to keep that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub content: Option<String>,
    pub metadata: Option<DocumentMetadata>,
    pub error: Option<String>,
    /// Wall-clock time spent on this document, in seconds.
    pub processing_time: f64,
}

impl ProcessingResult {
    pub fn succeeded(content: String, metadata: DocumentMetadata, processing_time: f64) -> Self {
        Self {
            success: true,
            content: Some(content),
            metadata: Some(metadata),
            error: None,
            processing_time,
        }
    }

    pub fn failed(error: impl Into<String>, processing_time: f64) -> Self {
        Self {
            success: false,
            content: None,
            metadata: None,
            error: Some(error.into()),
            processing_time,
        }
    }

    /// Flatten into a single tabular row.
    ///
    /// Successful results yield every metadata field plus `processing_time`
    /// and `processing_success`; failures yield only `error`,
    /// `processing_time` and `processing_success`.
    pub fn to_row(&self) -> Result<ResultRow, serde_json::Error> {
        let mut row = match (&self.metadata, self.success) {
            (Some(meta), true) => match serde_json::to_value(meta)? {
                serde_json::Value::Object(fields) => fields,
                other => {
                    let mut m = serde_json::Map::new();
                    m.insert("metadata".into(), other);
                    m
                }
            },
            _ => {
                let mut m = serde_json::Map::new();
                m.insert(
                    "error".into(),
                    self.error.clone().map_or(serde_json::Value::Null, Into::into),
                );
                m
            }
        };
        row.insert("processing_time".into(), self.processing_time.into());
        row.insert("processing_success".into(), self.success.into());
        Ok(serde_json::Value::Object(row))
    }
}

/// One flattened [`ProcessingResult`], a JSON object.
pub type ResultRow = serde_json::Value;

/// A bounded slice of document text sized for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position in the chunk sequence.
    pub chunk_id: usize,
    pub text: String,
    /// Byte offset of `text` within the source string.
    pub start_offset: usize,
    pub char_count: usize,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// What the content extractor wrote for one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Final Markdown, image references spliced in.
    pub content: String,
    pub markdown_path: PathBuf,
    pub image_count: usize,
    pub formula_count: usize,
    /// Image placeholders left in `content` because no picture was extracted for them.
    pub unmatched_images: usize,
    /// Image paths relative to the output root, e.g. `images/2017_Transformer/image_000.png`.
    pub image_paths: Vec<String>,
    /// Seconds, rounded to 2 decimals.
    pub extraction_time: f64,
}
