//! Processor and content-extractor tests with a stub conversion engine.
//!
//! The stub returns canned Markdown, so these tests need neither pdfium nor
//! an LLM provider. Image extraction still runs against the fake PDF bytes
//! and yields no images.

use async_trait::async_trait;
use paper_curator::{
    ContentExtractor, CurateError, DocumentConverter, DocumentProcessor, DocumentType,
    ProcessorConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Returns the same Markdown for every file, or fails for names containing "broken".
struct StubConverter {
    markdown: String,
    calls: AtomicUsize,
}

impl StubConverter {
    fn new(markdown: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            markdown: markdown.into(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DocumentConverter for StubConverter {
    async fn convert(&self, pdf_path: &Path) -> Result<String, CurateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if pdf_path.to_string_lossy().contains("broken") {
            return Err(CurateError::ConversionFailed {
                path: pdf_path.to_path_buf(),
                detail: "stub failure".into(),
            });
        }
        Ok(self.markdown.clone())
    }
}

/// A six-thousand-word paper with an abstract and references but no tables or figures.
fn long_paper() -> String {
    let body = (0..6000).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    format!("# A Paper\n\n## Abstract\n\nWe study things.\n\n{body}\n\n## References\n\n[1] Someone.\n")
}

fn fake_pdf(root: &Path, category: &str, name: &str) -> PathBuf {
    let dir = root.join(category);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
    path
}

fn quick_config() -> ProcessorConfig {
    ProcessorConfig::builder().pacing_delay_ms(0).build().unwrap()
}

#[tokio::test]
async fn long_paper_scores_point_nine() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "03_language_models", "2018_BERT.pdf");
    let converter = StubConverter::new(long_paper());
    let mut processor = DocumentProcessor::with_converter(quick_config(), converter).unwrap();

    let result = processor.process_document(&pdf).await;
    assert!(result.success, "error: {:?}", result.error);
    assert!(result.error.is_none());
    assert!(result.content.is_some());

    let meta = result.metadata.clone().unwrap();
    assert_eq!(meta.filename, "2018_BERT.pdf");
    assert_eq!(meta.title, "2018 BERT");
    assert_eq!(meta.year, Some(2018));
    assert_eq!(meta.category, "03_language_models");
    assert_eq!(meta.document_type, DocumentType::ResearchPaper);
    assert!(meta.has_abstract && meta.has_references);
    assert!(!meta.has_tables && !meta.has_figures);
    assert!(meta.word_count >= 6000);
    assert_eq!(meta.quality_score, 0.90);
    assert_eq!(meta.extraction_confidence, 0.85);
    assert_eq!(meta.document_id.len(), 16);
    assert!(processor.meets_quality_threshold(&meta));

    let row = result.to_row().unwrap();
    assert_eq!(row["document_id"], meta.document_id.as_str());
    assert_eq!(row["category"], "03_language_models");
    assert_eq!(row["quality_score"], 0.90);
    assert_eq!(row["processing_success"], true);
    assert!(row.get("error").is_none());
}

#[tokio::test]
async fn failures_are_captured_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "02_infrastructure", "2016_broken.pdf");
    let mut processor =
        DocumentProcessor::with_converter(quick_config(), StubConverter::new("unused")).unwrap();

    let result = processor.process_document(&pdf).await;
    assert!(!result.success);
    assert!(result.content.is_none());
    assert!(result.metadata.is_none());
    assert!(result.error.as_deref().unwrap().contains("stub failure"));
    assert!(result.processing_time >= 0.0);

    let row = result.to_row().unwrap();
    assert_eq!(row["processing_success"], false);
    assert!(row.get("document_id").is_none());
}

#[tokio::test]
async fn missing_file_fails_at_metadata() {
    let mut processor =
        DocumentProcessor::with_converter(quick_config(), StubConverter::new("text")).unwrap();
    let result = processor.process_document(Path::new("/no/such/dir/2020_x.pdf")).await;
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn batch_keeps_order_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        fake_pdf(dir.path(), "c", "2014_Seq2Seq.pdf"),
        fake_pdf(dir.path(), "c", "2015_broken.pdf"),
        fake_pdf(dir.path(), "c", "2015_ResNet.pdf"),
    ];
    let converter = StubConverter::new("# Short\n\nA user guide for the tool.\n");
    let mut processor =
        DocumentProcessor::with_converter(quick_config(), Arc::clone(&converter) as Arc<dyn DocumentConverter>)
            .unwrap();

    let results = processor.batch_process(&paths).await;
    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[2].success);
    assert_eq!(
        results[0].metadata.as_ref().unwrap().document_type,
        DocumentType::Manual
    );
    assert_eq!(converter.calls.load(Ordering::SeqCst), 3);

    let stats = processor.stats().clone();
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 1);
    let snap = stats.snapshot();
    assert_eq!(snap.success_rate, Some(66.7));

    processor.reset_stats();
    assert_eq!(processor.stats().total_processed, 0);
    assert_eq!(processor.stats().snapshot().success_rate, None);
}

#[tokio::test]
async fn short_text_scores_base_only() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "c", "notes.pdf");
    let mut processor =
        DocumentProcessor::with_converter(quick_config(), StubConverter::new("just a few words"))
            .unwrap();
    let meta = processor.process_document(&pdf).await.metadata.unwrap();
    assert_eq!(meta.quality_score, 0.40);
    assert_eq!(meta.year, None);
    assert_eq!(meta.document_type, DocumentType::General);
    assert!(!processor.meets_quality_threshold(&meta));
}

#[tokio::test]
async fn extractor_writes_markdown_and_keeps_unmatched_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "04_multimodal", "2021_CLIP.pdf");
    let out = dir.path().join("processed");
    let markdown = "# CLIP\n\n<!-- image -->\n\nText.\n\n<!-- formula -->\n<!-- formula -->\n";
    let extractor = ContentExtractor::new(StubConverter::new(markdown), &out);

    let output = extractor.extract(&pdf).await.unwrap();
    assert_eq!(output.markdown_path, out.join("2021_CLIP.md"));
    assert_eq!(output.image_count, 0);
    assert!(output.image_paths.is_empty());
    assert_eq!(output.formula_count, 2);
    assert_eq!(output.unmatched_images, 1);
    assert!(output.extraction_time >= 0.0);
    assert_eq!(output.content, markdown);
    assert_eq!(std::fs::read_to_string(&output.markdown_path).unwrap(), markdown);
}

#[tokio::test]
async fn processor_with_output_dir_runs_extractor() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "01_model_paradigm", "2017_Transformer.pdf");
    let out = dir.path().join("processed");
    let config = ProcessorConfig::builder()
        .pacing_delay_ms(0)
        .output_dir(&out)
        .build()
        .unwrap();
    let mut processor =
        DocumentProcessor::with_converter(config, StubConverter::new(long_paper())).unwrap();

    let result = processor.process_document(&pdf).await;
    assert!(result.success, "error: {:?}", result.error);
    assert!(out.join("2017_Transformer.md").exists());
}

#[tokio::test]
async fn chunks_carry_document_identity() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "03_language_models", "2020_GPT_3.pdf");
    let mut processor =
        DocumentProcessor::with_converter(quick_config(), StubConverter::new(long_paper())).unwrap();
    let result = processor.process_document(&pdf).await;
    let content = result.content.as_deref().unwrap();
    let meta = result.metadata.as_ref().unwrap();

    let chunks = processor.chunk_content(content, Some(meta));
    assert!(chunks.len() > 10);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, i);
        assert!(chunk.char_count <= 1000);
        assert_eq!(chunk.document_id.as_deref(), Some(meta.document_id.as_str()));
        assert_eq!(chunk.category.as_deref(), Some("03_language_models"));
    }
}

#[test]
fn overlap_not_below_size_is_rejected() {
    assert!(ProcessorConfig::builder()
        .chunk_size(100)
        .chunk_overlap(100)
        .build()
        .is_err());
}
