//! Structure analysis: cheap regex heuristics over converted Markdown.
//!
//! These markers are approximate. "abstract" in an early sentence counts as
//! an abstract; a paper whose bibliography is titled "Bibliography" has no
//! references. The patterns and look-ahead windows are fixed so that scores
//! stay comparable across runs.

use crate::output::StructureFeatures;
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters at the start of the document searched for an abstract marker.
pub const ABSTRACT_WINDOW_CHARS: usize = 2000;

/// A document with more `|` characters than this is assumed to contain a table.
pub const TABLE_PIPE_THRESHOLD: usize = 10;

static RE_ABSTRACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\babstract\b").unwrap());
static RE_REFERENCES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\breferences?\b").unwrap());
static RE_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(figure|fig\.|圖)\s*\d+").unwrap());

/// Compute the structural feature set of `content`.
pub fn analyze_structure(content: &str) -> StructureFeatures {
    StructureFeatures {
        has_abstract: RE_ABSTRACT.is_match(prefix_chars(content, ABSTRACT_WINDOW_CHARS)),
        has_references: RE_REFERENCES.is_match(content),
        has_tables: content.matches('|').count() > TABLE_PIPE_THRESHOLD,
        has_figures: RE_FIGURE.is_match(content),
        word_count: content.split_whitespace().count(),
        char_count: content.chars().count(),
        header_count: content.matches('#').count(),
    }
}

/// The first `n` characters of `s` (not bytes).
pub(crate) fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
