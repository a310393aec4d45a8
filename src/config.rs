//! Configuration types for downloading and processing.
//!
//! Two independent configs exist because the two halves of the tool run
//! independently: [`FetchConfig`] drives the [`crate::fetch::Fetcher`],
//! [`ProcessorConfig`] drives the [`crate::processor::DocumentProcessor`].
//! Both are built through validating builders; `Default` gives the values
//! the collection was originally curated with.

use crate::error::CurateError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Browser-like user agent; some publisher CDNs reject obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Status codes retried with backoff.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

// ── Fetch ────────────────────────────────────────────────────────────────

/// Configuration for [`crate::fetch::Fetcher`].
///
/// # Example
/// ```rust
/// use paper_curator::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .max_retries(5)
///     .politeness_delay_ms(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Connect and read-inactivity timeout in seconds. Default: 30.
    pub timeout_secs: u64,

    /// Retries after the first attempt on a transient failure. Default: 3.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds. Default: 1000.
    ///
    /// Retry `n` (1-based) waits `backoff_base_ms * 2^(n-1)`: 1 s, 2 s, 4 s.
    /// A `Retry-After` header on the response takes precedence.
    pub backoff_base_ms: u64,

    /// HTTP statuses treated as transient. Default: 429, 500, 502, 503, 504.
    pub retry_statuses: Vec<u16>,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Pause between consecutive downloads in a batch, in milliseconds. Default: 1000.
    pub politeness_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1000,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            politeness_delay_ms: 1000,
        }
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn backoff_base_ms(mut self, ms: u64) -> Self {
        self.config.backoff_base_ms = ms;
        self
    }

    pub fn retry_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.config.retry_statuses = statuses.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn politeness_delay_ms(mut self, ms: u64) -> Self {
        self.config.politeness_delay_ms = ms;
        self
    }

    pub fn build(self) -> Result<FetchConfig, CurateError> {
        if self.config.timeout_secs == 0 {
            return Err(CurateError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if self.config.user_agent.trim().is_empty() {
            return Err(CurateError::InvalidConfig("User agent must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Conversion ───────────────────────────────────────────────────────────

/// Settings for transcribing image-only pages with a vision model.
///
/// Only consulted when [`ConverterOptions::do_ocr`] is on and a page has no
/// extractable text layer.
#[derive(Clone)]
pub struct OcrConfig {
    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Model identifier, e.g. "gpt-4.1-nano".
    pub model: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum output tokens per page. Default: 4096.
    pub max_tokens: usize,

    /// Retries per page on a failed VLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Longest edge of a rasterised page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_rendered_pixels: 2000,
            api_timeout_secs: 60,
        }
    }
}

impl OcrConfig {
    /// Delay before OCR retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .finish()
    }
}

/// Pipeline flags for the conversion engine.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Transcribe pages without a text layer through a vision model. Default: true.
    pub do_ocr: bool,

    /// Ask for GFM tables on transcribed pages and repair missing separator
    /// rows in the output. Default: true.
    pub do_table_structure: bool,

    /// Classify pictures and drop decorative ones (icons, rules, bullets)
    /// from both placeholders and extracted images. Default: false.
    pub do_picture_classification: bool,

    pub ocr: OcrConfig,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            do_ocr: true,
            do_table_structure: true,
            do_picture_classification: false,
            ocr: OcrConfig::default(),
        }
    }
}

// ── Processing ───────────────────────────────────────────────────────────

/// Configuration for [`crate::processor::DocumentProcessor`].
///
/// # Example
/// ```rust
/// use paper_curator::ProcessorConfig;
///
/// let config = ProcessorConfig::builder()
///     .chunk_size(800)
///     .chunk_overlap(100)
///     .quality_threshold(0.75)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 800);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Target chunk length in characters. Default: 1000.
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks. Default: 200.
    pub chunk_overlap: usize,

    /// Minimum quality score considered acceptable. Default: 0.7.
    pub quality_threshold: f64,

    /// Pause between documents in a batch, in milliseconds. Default: 100.
    pub pacing_delay_ms: u64,

    /// When set, each processed document is written as `{dir}/{stem}.md`
    /// with its images under `{dir}/images/{stem}/`.
    pub output_dir: Option<PathBuf>,

    pub converter: ConverterOptions,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            quality_threshold: 0.7,
            pacing_delay_ms: 100,
            output_dir: None,
            converter: ConverterOptions::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessorConfig`].
#[derive(Debug)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn chunk_overlap(mut self, n: usize) -> Self {
        self.config.chunk_overlap = n;
        self
    }

    pub fn quality_threshold(mut self, t: f64) -> Self {
        self.config.quality_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn pacing_delay_ms(mut self, ms: u64) -> Self {
        self.config.pacing_delay_ms = ms;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn do_ocr(mut self, v: bool) -> Self {
        self.config.converter.do_ocr = v;
        self
    }

    pub fn do_table_structure(mut self, v: bool) -> Self {
        self.config.converter.do_table_structure = v;
        self
    }

    pub fn do_picture_classification(mut self, v: bool) -> Self {
        self.config.converter.do_picture_classification = v;
        self
    }

    pub fn ocr(mut self, ocr: OcrConfig) -> Self {
        self.config.converter.ocr = ocr;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessorConfig, CurateError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(CurateError::InvalidConfig("Chunk size must be ≥ 1".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(CurateError::InvalidConfig(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        Ok(self.config)
    }
}
