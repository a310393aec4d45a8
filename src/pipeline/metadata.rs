//! Metadata synthesis: identifiers, hashes, and path-derived fields.
//!
//! Everything except `document_type` comes from the file path or a hash;
//! nothing here looks inside the PDF. Papers are stored as
//! `{category}/{year}_{Name_With_Underscores}.pdf`, so the path already
//! carries the year, the category, and a readable title.

use crate::error::CurateError;
use crate::output::{DocumentMetadata, DocumentType, StructureFeatures};
use crate::pipeline::structure::prefix_chars;
use chrono::{DateTime, Local};
use md5::Md5;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Fixed: the converter does not report a confidence.
pub const EXTRACTION_CONFIDENCE: f64 = 0.85;

/// Characters inspected by the keyword rules of [`detect_document_type`].
pub const TYPE_WINDOW_CHARS: usize = 5000;

static RE_LEADING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{4})").unwrap());

/// Keyword rules in priority order; the first rule with a hit wins.
const KEYWORD_RULES: [(DocumentType, &[&str]); 4] = [
    (DocumentType::TechnicalDoc, &["api", "specification", "implementation"]),
    (DocumentType::Report, &["report", "analysis", "findings"]),
    (DocumentType::Manual, &["manual", "guide", "tutorial"]),
    (DocumentType::Policy, &["policy", "compliance", "regulation"]),
];

/// Build the metadata record for `path` from its extracted `content`.
///
/// `quality_score` is left at `0.0`.
pub fn synthesize_metadata(
    path: &Path,
    content: &str,
    features: &StructureFeatures,
) -> Result<DocumentMetadata, CurateError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CurateError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let fs_meta = std::fs::metadata(path).map_err(|e| CurateError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Some filesystems do not record birth time.
    let created = fs_meta
        .created()
        .or_else(|_| fs_meta.modified())
        .map_err(|e| CurateError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(DocumentMetadata {
        document_id: document_id(&filename),
        filename,
        title: title_from_stem(&stem),
        content_hash: content_hash(content),
        category: category_from_path(path),
        document_type: detect_document_type(content, features),
        year: year_from_stem(&stem),
        word_count: features.word_count,
        char_count: features.char_count,
        page_count: None,
        has_abstract: features.has_abstract,
        has_references: features.has_references,
        has_tables: features.has_tables,
        has_figures: features.has_figures,
        quality_score: 0.0,
        extraction_confidence: EXTRACTION_CONFIDENCE,
        created_at: DateTime::<Local>::from(created),
        processed_at: Local::now(),
        keywords: None,
        language: "en".to_string(),
        authors: None,
    })
}

/// First 16 hex chars of the MD5 of the file name. Independent of content:
/// two files with the same name get the same id.
pub fn document_id(filename: &str) -> String {
    let digest = Md5::digest(filename.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// First 16 hex chars of the SHA-256 of the text.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Leading four-digit run of the stem, e.g. `2019_GPT_2` → 2019.
pub fn year_from_stem(stem: &str) -> Option<i32> {
    RE_LEADING_YEAR
        .captures(stem)
        .and_then(|c| c[1].parse().ok())
}

pub fn title_from_stem(stem: &str) -> String {
    stem.replace('_', " ")
}

/// Name of the immediate parent directory, or empty.
pub fn category_from_path(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Classify the document.
///
/// An abstract together with references makes a research paper regardless of
/// any keywords. Otherwise the lower-cased first [`TYPE_WINDOW_CHARS`]
/// characters are searched for plain substrings, rule by rule.
pub fn detect_document_type(content: &str, features: &StructureFeatures) -> DocumentType {
    if features.has_abstract && features.has_references {
        return DocumentType::ResearchPaper;
    }

    let lowered = content.to_lowercase();
    let window = prefix_chars(&lowered, TYPE_WINDOW_CHARS);

    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| window.contains(k)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::General)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structure::analyze_structure;

    #[test]
    fn path_derived_fields() {
        let path = Path::new("papers/03_language_models/2019_GPT_2.pdf");
        assert_eq!(year_from_stem("2019_GPT_2"), Some(2019));
        assert_eq!(category_from_path(path), "03_language_models");
        assert_eq!(title_from_stem("2019_GPT_2"), "2019 GPT 2");
    }

    #[test]
    fn year_requires_leading_digits() {
        assert_eq!(year_from_stem("GPT_2019"), None);
        assert_eq!(year_from_stem("201_x"), None);
        assert_eq!(year_from_stem("20190_x"), Some(2019));
    }

    #[test]
    fn ids_are_16_hex_chars() {
        let id = document_id("2017_Transformer.pdf");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, document_id("2017_Transformer.pdf"));
        assert_ne!(id, document_id("2017_MoE.pdf"));
    }

    #[test]
    fn known_digests() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(document_id(""), "d41d8cd98f00b204");
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(content_hash(""), "e3b0c44298fc1c14");
    }

    #[test]
    fn research_paper_wins_over_keywords() {
        let md = "Abstract\nThis policy paper on compliance.\nReferences\n[1] x";
        let f = analyze_structure(md);
        assert_eq!(detect_document_type(md, &f), DocumentType::ResearchPaper);
    }

    #[test]
    fn keyword_rules_follow_priority() {
        let none = StructureFeatures::default();
        assert_eq!(
            detect_document_type("A user guide and the API surface", &none),
            DocumentType::TechnicalDoc
        );
        assert_eq!(
            detect_document_type("Findings of the tutorial", &none),
            DocumentType::Report
        );
        assert_eq!(detect_document_type("Owner's MANUAL", &none), DocumentType::Manual);
        assert_eq!(
            detect_document_type("Data regulation notes", &none),
            DocumentType::Policy
        );
        assert_eq!(detect_document_type("hello world", &none), DocumentType::General);
    }

    #[test]
    fn keywords_past_window_are_ignored() {
        let none = StructureFeatures::default();
        let md = format!("{} policy", "z".repeat(TYPE_WINDOW_CHARS));
        assert_eq!(detect_document_type(&md, &none), DocumentType::General);
    }

    #[test]
    fn synthesize_from_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let cat = dir.path().join("03_language_models");
        std::fs::create_dir_all(&cat).unwrap();
        let pdf = cat.join("2019_GPT_2.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let content = "Abstract\nLanguage models.\nReferences\n";
        let features = analyze_structure(content);
        let meta = synthesize_metadata(&pdf, content, &features).unwrap();

        assert_eq!(meta.filename, "2019_GPT_2.pdf");
        assert_eq!(meta.title, "2019 GPT 2");
        assert_eq!(meta.year, Some(2019));
        assert_eq!(meta.category, "03_language_models");
        assert_eq!(meta.document_type, DocumentType::ResearchPaper);
        assert_eq!(meta.quality_score, 0.0);
        assert_eq!(meta.extraction_confidence, 0.85);
        assert_eq!(meta.page_count, None);
        assert_eq!(meta.language, "en");
        assert_eq!(meta.content_hash, content_hash(content));
    }

    #[test]
    fn synthesize_missing_file_errors() {
        let features = StructureFeatures::default();
        let err = synthesize_metadata(Path::new("/no/such/dir/x.pdf"), "", &features).unwrap_err();
        assert!(matches!(err, CurateError::ReadFailed { .. }));
    }
}
