//! The batch driver: extract → analyze → synthesize → score, per document.
//!
//! [`DocumentProcessor::process_document`] never returns an error. Whatever
//! fails inside one document is recorded on its [`ProcessingResult`] and the
//! batch moves on to the next file.

use crate::config::ProcessorConfig;
use crate::error::CurateError;
use crate::extract::ContentExtractor;
use crate::output::{Chunk, DocumentMetadata, ProcessingResult};
use crate::pipeline::chunk::Chunker;
use crate::pipeline::convert::{DocumentConverter, PdfiumConverter};
use crate::pipeline::metadata::synthesize_metadata;
use crate::pipeline::quality::assess_quality;
use crate::pipeline::structure::analyze_structure;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Running counters for one processor instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Seconds.
    pub total_time: f64,
}

/// [`ProcessingStats`] plus derived rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: ProcessingStats,
    /// Percent, 1 decimal. `None` before the first document.
    pub success_rate: Option<f64>,
    /// Seconds per document, 2 decimals. `None` before the first document.
    pub avg_time_secs: Option<f64>,
}

impl ProcessingStats {
    fn record(&mut self, success: bool, elapsed: f64) {
        self.total_processed += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.total_time += elapsed;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let (success_rate, avg_time_secs) = if self.total_processed > 0 {
            let n = self.total_processed as f64;
            (
                Some(round_to(self.successful as f64 / n * 100.0, 1)),
                Some(round_to(self.total_time / n, 2)),
            )
        } else {
            (None, None)
        };
        StatsSnapshot {
            stats: self.clone(),
            success_rate,
            avg_time_secs,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Runs documents through the pipeline and keeps stats.
pub struct DocumentProcessor {
    config: ProcessorConfig,
    converter: Arc<dyn DocumentConverter>,
    extractor: Option<ContentExtractor>,
    chunker: Chunker,
    stats: ProcessingStats,
}

impl DocumentProcessor {
    /// Processor backed by [`PdfiumConverter`] with the configured flags.
    pub fn new(config: ProcessorConfig) -> Result<Self, CurateError> {
        let converter = Arc::new(PdfiumConverter::new(config.converter.clone()));
        Self::with_converter(config, converter)
    }

    /// Processor backed by any conversion engine.
    pub fn with_converter(
        config: ProcessorConfig,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self, CurateError> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        let extractor = config.output_dir.as_ref().map(|dir| {
            ContentExtractor::new(Arc::clone(&converter), dir.clone())
                .skip_decorative(config.converter.do_picture_classification)
        });
        Ok(Self {
            config,
            converter,
            extractor,
            chunker,
            stats: ProcessingStats::default(),
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ProcessingStats::default();
    }

    /// Process one document; failures become a failed result.
    pub async fn process_document(&mut self, path: &Path) -> ProcessingResult {
        let start = Instant::now();
        let outcome = self.run_stages(path).await;
        let elapsed = start.elapsed().as_secs_f64();

        let result = match outcome {
            Ok((content, metadata)) => {
                info!(
                    "Processed {} ({}, {} words, quality {:.2}, {:.2}s)",
                    path.display(),
                    metadata.document_type,
                    metadata.word_count,
                    metadata.quality_score,
                    elapsed
                );
                ProcessingResult::succeeded(content, metadata, elapsed)
            }
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                ProcessingResult::failed(e.to_string(), elapsed)
            }
        };
        self.stats.record(result.success, elapsed);
        result
    }

    async fn run_stages(&self, path: &Path) -> Result<(String, DocumentMetadata), CurateError> {
        let content = match &self.extractor {
            Some(extractor) => extractor.extract(path).await?.content,
            None => self.converter.convert(path).await?,
        };
        let features = analyze_structure(&content);
        let mut metadata = synthesize_metadata(path, &content, &features)?;
        metadata.quality_score = assess_quality(&metadata);
        Ok((content, metadata))
    }

    /// Process `paths` in order, pausing `pacing_delay_ms` between items.
    pub async fn batch_process(&mut self, paths: &[PathBuf]) -> Vec<ProcessingResult> {
        let pacing = Duration::from_millis(self.config.pacing_delay_ms);
        let mut results = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            if i > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            info!("[{}/{}] {}", i + 1, paths.len(), path.display());
            results.push(self.process_document(path).await);
        }
        results
    }

    /// Split `text` with the configured chunk size and overlap.
    pub fn chunk_content(&self, text: &str, metadata: Option<&DocumentMetadata>) -> Vec<Chunk> {
        self.chunker.chunk(text, metadata)
    }

    pub fn meets_quality_threshold(&self, metadata: &DocumentMetadata) -> bool {
        metadata.quality_score >= self.config.quality_threshold
    }
}
