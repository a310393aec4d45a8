//! The paper catalog: which papers to fetch and where they live.
//!
//! [`builtin()`] returns the fixed 32-paper reading list, grouped into four
//! category folders. A catalog can also be loaded from a JSON array with the
//! same shape via [`load_catalog`]:
//!
//! ```json
//! [
//!   { "category": "03_language_models", "year": "2018", "name": "BERT",
//!     "type": "arxiv", "arxiv_id": "1810.04805" },
//!   { "category": "03_language_models", "year": "2019", "name": "GPT_2",
//!     "type": "pdf", "url": "https://cdn.openai.com/.../paper.pdf" }
//! ]
//! ```

use crate::error::CurateError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a paper's PDF comes from.
///
/// Serialised with an internal `type` tag. Unrecognised tags deserialise to
/// [`PaperSource::Unknown`] so that one bad entry fails at download time
/// rather than rejecting the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaperSource {
    /// An arXiv identifier such as `1810.04805`.
    Arxiv { arxiv_id: String },
    /// A direct link to a PDF on a publisher or author site.
    Pdf { url: String },
    #[serde(other)]
    Unknown,
}

impl PaperSource {
    /// The media-type tag used in catalog files.
    pub fn media_type(&self) -> &'static str {
        match self {
            PaperSource::Arxiv { .. } => "arxiv",
            PaperSource::Pdf { .. } => "pdf",
            PaperSource::Unknown => "unknown",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Target sub-folder, e.g. `03_language_models`.
    pub category: String,
    /// Four-digit publication year.
    pub year: String,
    /// File-name-safe short name, e.g. `GPT_2`.
    pub name: String,
    #[serde(flatten)]
    pub source: PaperSource,
    /// Free-form remark such as a paywall warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PaperRecord {
    pub fn arxiv(category: &str, year: &str, name: &str, arxiv_id: &str) -> Self {
        Self {
            category: category.to_string(),
            year: year.to_string(),
            name: name.to_string(),
            source: PaperSource::Arxiv {
                arxiv_id: arxiv_id.to_string(),
            },
            note: None,
        }
    }

    pub fn pdf(category: &str, year: &str, name: &str, url: &str) -> Self {
        Self {
            category: category.to_string(),
            year: year.to_string(),
            name: name.to_string(),
            source: PaperSource::Pdf {
                url: url.to_string(),
            },
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// `{year}_{name}.pdf`
    pub fn file_name(&self) -> String {
        format!("{}_{}.pdf", self.year, self.name)
    }
}

/// Load a catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Vec<PaperRecord>, CurateError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CurateError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&raw).map_err(|detail| CurateError::InvalidCatalog {
        path: path.to_path_buf(),
        detail,
    })
}

/// Parse a catalog from a JSON string.
pub fn parse_catalog(json: &str) -> Result<Vec<PaperRecord>, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// The built-in reading list: 32 papers in four categories.
pub fn builtin() -> Vec<PaperRecord> {
    const PARADIGM: &str = "01_model_paradigm";
    const INFRA: &str = "02_infrastructure";
    const LANGUAGE: &str = "03_language_models";
    const MULTIMODAL: &str = "04_multimodal";

    vec![
        // Model paradigm shift (11)
        PaperRecord::pdf(
            PARADIGM,
            "2004",
            "Brook_for_GPUs",
            "https://dl.acm.org/doi/pdf/10.1145/1015706.1015800",
        )
        .with_note("ACM paywall - requires institutional access"),
        PaperRecord::pdf(
            PARADIGM,
            "2012",
            "AlexNet",
            "https://proceedings.neurips.cc/paper/4824-imagenet-classification-with-deep-convolutional-neural-networks.pdf",
        ),
        PaperRecord::arxiv(PARADIGM, "2014", "Seq2Seq", "1409.3215"),
        PaperRecord::arxiv(PARADIGM, "2015", "Knowledge_Distillation", "1503.02531"),
        PaperRecord::arxiv(PARADIGM, "2015", "ResNet", "1512.03385"),
        PaperRecord::arxiv(PARADIGM, "2017", "Transformer", "1706.03762"),
        PaperRecord::pdf(
            PARADIGM,
            "2017",
            "AlphaGo_Zero",
            "https://www.nature.com/articles/nature24270.pdf",
        )
        .with_note("Nature paywall - may require subscription"),
        PaperRecord::arxiv(PARADIGM, "2017", "MoE", "1701.06538"),
        PaperRecord::arxiv(PARADIGM, "2021", "LoRA", "2106.09685"),
        PaperRecord::arxiv(PARADIGM, "2022", "Chain_of_Thought", "2201.11903"),
        PaperRecord::arxiv(PARADIGM, "2022", "ReAct", "2210.03629"),
        // Infrastructure & data (5)
        PaperRecord::arxiv(INFRA, "2019", "ZeRO", "1910.02054"),
        PaperRecord::arxiv(INFRA, "2020", "Scaling_Laws", "2001.08361"),
        PaperRecord::arxiv(INFRA, "2022", "LAION_5B", "2210.08402"),
        PaperRecord::arxiv(INFRA, "2023", "RefinedWeb", "2306.01116"),
        PaperRecord::arxiv(INFRA, "2024", "MegaScale", "2402.15627"),
        // Language models (8)
        PaperRecord::arxiv(LANGUAGE, "2013", "Word2Vec", "1301.3781"),
        PaperRecord::arxiv(LANGUAGE, "2016", "Google_NMT", "1609.08144"),
        PaperRecord::pdf(
            LANGUAGE,
            "2018",
            "GPT_1",
            "https://cdn.openai.com/research-covers/language-unsupervised/language_understanding_paper.pdf",
        ),
        PaperRecord::arxiv(LANGUAGE, "2018", "BERT", "1810.04805"),
        PaperRecord::pdf(
            LANGUAGE,
            "2019",
            "GPT_2",
            "https://cdn.openai.com/better-language-models/language_models_are_unsupervised_multitask_learners.pdf",
        ),
        PaperRecord::arxiv(LANGUAGE, "2020", "GPT_3", "2005.14165"),
        PaperRecord::arxiv(LANGUAGE, "2022", "InstructGPT", "2203.02155"),
        PaperRecord::arxiv(LANGUAGE, "2024", "TULU_3", "2407.15541"),
        // Multimodal models (8)
        PaperRecord::pdf(
            MULTIMODAL,
            "2014",
            "DeepVideo",
            "https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/42455.pdf",
        )
        .with_note("CVPR 2014"),
        PaperRecord::arxiv(MULTIMODAL, "2014", "Two_Stream_CNN", "1406.2199"),
        PaperRecord::arxiv(MULTIMODAL, "2015", "GAN", "1406.2661"),
        PaperRecord::arxiv(MULTIMODAL, "2020", "DDPM", "2006.11239"),
        PaperRecord::arxiv(MULTIMODAL, "2020", "ViT", "2010.11929"),
        PaperRecord::arxiv(MULTIMODAL, "2021", "CLIP", "2103.00020"),
        PaperRecord::arxiv(MULTIMODAL, "2022", "Stable_Diffusion", "2112.10752"),
        PaperRecord::arxiv(MULTIMODAL, "2022", "DiT", "2212.09748"),
    ]
}
