//! The conversion engine seam: PDF file → Markdown text.
//!
//! [`DocumentConverter`] is what the processor and the content extractor
//! depend on; [`PdfiumConverter`] is the production implementation.
//!
//! ## PdfiumConverter
//!
//! One blocking pass over the document collects, per page:
//! * the text layer (`PdfPageText::all`)
//! * one `<!-- image -->` line per picture (see [`page_figures`])
//! * a rendered bitmap when the text layer is empty and OCR is on
//!
//! Scanned pages are then transcribed on the async side. A page whose OCR
//! fails keeps its picture placeholders and contributes no text. Pages are
//! joined with a blank line and the result goes through
//! [`clean_markdown`].

use crate::config::ConverterOptions;
use crate::error::CurateError;
use crate::pipeline::ocr::{encode_page, render_page, resolve_provider, transcribe_page};
use crate::pipeline::pdfium::{bind_pdfium, open_document, page_figures};
use crate::pipeline::postprocess::clean_markdown;
use async_trait::async_trait;
use edgequake_llm::LLMProvider;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Placeholder written wherever a picture sits in the page flow.
pub const IMAGE_PLACEHOLDER: &str = "<!-- image -->";

/// Converts one PDF into Markdown.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, pdf_path: &Path) -> Result<String, CurateError>;
}

/// pdfium text-layer converter with a vision-model OCR fallback.
#[derive(Debug, Clone, Default)]
pub struct PdfiumConverter {
    options: ConverterOptions,
}

/// What the blocking pass learned about one page.
struct PageDraft {
    text: String,
    figures: usize,
    scan: Option<DynamicImage>,
}

impl PageDraft {
    fn placeholders(&self) -> String {
        vec![IMAGE_PLACEHOLDER; self.figures].join("\n\n")
    }

    fn into_markdown(self, transcription: Option<String>) -> String {
        if let Some(t) = transcription {
            return t;
        }
        let body = self.text.trim();
        let placeholders = self.placeholders();
        match (body.is_empty(), placeholders.is_empty()) {
            (_, true) => body.to_string(),
            (true, false) => placeholders,
            (false, false) => format!("{body}\n\n{placeholders}"),
        }
    }
}

impl PdfiumConverter {
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    async fn read_pages(&self, pdf_path: &Path) -> Result<Vec<PageDraft>, CurateError> {
        let path = pdf_path.to_path_buf();
        let render_scans = self.options.do_ocr;
        let skip_decorative = self.options.do_picture_classification;
        let max_pixels = self.options.ocr.max_rendered_pixels;

        tokio::task::spawn_blocking(move || {
            read_pages_blocking(&path, render_scans, skip_decorative, max_pixels)
        })
        .await
        .map_err(|e| CurateError::Internal(format!("Conversion task panicked: {}", e)))?
    }

    async fn transcribe(
        &self,
        provider: &Arc<dyn LLMProvider>,
        page_num: usize,
        scan: &DynamicImage,
    ) -> Option<String> {
        let result = match encode_page(scan, page_num) {
            Ok(image) => {
                transcribe_page(
                    provider,
                    page_num,
                    image,
                    &self.options.ocr,
                    self.options.do_table_structure,
                )
                .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(md) => Some(clean_markdown(&md, self.options.do_table_structure).trim_end().to_string()),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

#[async_trait]
impl DocumentConverter for PdfiumConverter {
    async fn convert(&self, pdf_path: &Path) -> Result<String, CurateError> {
        let drafts = self.read_pages(pdf_path).await?;
        let scanned = drafts.iter().filter(|d| d.scan.is_some()).count();
        info!(
            "{}: {} pages, {} without a text layer",
            pdf_path.display(),
            drafts.len(),
            scanned
        );

        let provider = if scanned > 0 {
            match resolve_provider(&self.options.ocr) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("OCR disabled for {}: {}", pdf_path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let mut pages = Vec::with_capacity(drafts.len());
        for (idx, mut draft) in drafts.into_iter().enumerate() {
            let transcription = match (&provider, draft.scan.take()) {
                (Some(provider), Some(scan)) => self.transcribe(provider, idx + 1, &scan).await,
                _ => None,
            };
            let md = draft.into_markdown(transcription);
            if !md.is_empty() {
                pages.push(md);
            }
        }

        Ok(clean_markdown(&pages.join("\n\n"), self.options.do_table_structure))
    }
}

fn read_pages_blocking(
    pdf_path: &Path,
    render_scans: bool,
    skip_decorative: bool,
    max_pixels: u32,
) -> Result<Vec<PageDraft>, CurateError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let mut drafts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_num = idx + 1;
        let text = page
            .text()
            .map(|t| t.all())
            .map_err(|e| CurateError::ConversionFailed {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {:?}", page_num, e),
            })?;
        let figures = page_figures(&page, page_num, skip_decorative).len();

        let scan = if render_scans && text.trim().is_empty() {
            match render_page(&page, page_num, max_pixels) {
                Ok(img) => Some(img),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        debug!("Page {}: {} chars, {} figures", page_num, text.len(), figures);
        drafts.push(PageDraft { text, figures, scan });
    }
    Ok(drafts)
}
