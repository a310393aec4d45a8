//! Fetching: download catalog papers into `{base}/{category}/{year}_{name}.pdf`.
//!
//! Each record ends in one of three outcomes:
//!
//! | Outcome | When |
//! |---------|------|
//! | [`FetchOutcome::Downloaded`] | 2xx response, body written |
//! | [`FetchOutcome::Skipped`] | target file already exists (no request made), or HTTP 403 |
//! | [`FetchOutcome::Failed`] | unknown source, other HTTP error, network error, retries exhausted |
//!
//! Transient statuses (429 and 5xx by default) and network errors are retried
//! with exponential backoff. The body is streamed into a `.part` file next to
//! the target and renamed into place once complete, so an interrupted transfer
//! never leaves a file that a later run would mistake for a finished download.

use crate::catalog::{PaperRecord, PaperSource};
use crate::config::FetchConfig;
use crate::error::CurateError;
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Base URL for arXiv PDFs.
pub const ARXIV_PDF_BASE: &str = "https://arxiv.org/pdf";

/// Why a record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target file was already on disk.
    AlreadyPresent,
    /// The server answered 403, usually a paywall.
    AccessDenied,
}

/// Coarse classification of a [`FetchOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    Skip,
    Fail,
}

/// Result of fetching one record.
#[derive(Debug)]
pub enum FetchOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { error: CurateError },
}

impl FetchOutcome {
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchOutcome::Downloaded { .. } => FetchStatus::Success,
            FetchOutcome::Skipped { .. } => FetchStatus::Skip,
            FetchOutcome::Failed { .. } => FetchStatus::Fail,
        }
    }
}

/// Aggregate result of [`Fetcher::download_all`].
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<(PaperRecord, FetchOutcome)>,
}

impl FetchSummary {
    fn push(&mut self, record: PaperRecord, outcome: FetchOutcome) {
        self.total += 1;
        match outcome.status() {
            FetchStatus::Success => self.success += 1,
            FetchStatus::Skip => self.skipped += 1,
            FetchStatus::Fail => self.failed += 1,
        }
        self.outcomes.push((record, outcome));
    }
}

/// HTTP downloader for catalog records.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
    arxiv_base: String,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, CurateError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CurateError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config,
            arxiv_base: ARXIV_PDF_BASE.to_string(),
        })
    }

    /// Serve arXiv ids from another host (mirrors, local test servers).
    pub fn with_arxiv_base(mut self, base: impl Into<String>) -> Self {
        self.arxiv_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The URL a record downloads from.
    pub fn resolve_url(&self, record: &PaperRecord) -> Result<String, CurateError> {
        match &record.source {
            PaperSource::Arxiv { arxiv_id } => Ok(format!("{}/{}.pdf", self.arxiv_base, arxiv_id)),
            PaperSource::Pdf { url } => Ok(url.clone()),
            PaperSource::Unknown => Err(CurateError::UnknownSourceType {
                name: format!("{}_{}", record.year, record.name),
            }),
        }
    }

    /// Fetch one record into `base_dir`.
    pub async fn download(&self, record: &PaperRecord, base_dir: &Path) -> FetchOutcome {
        let category_dir = base_dir.join(&record.category);
        if let Err(source) = tokio::fs::create_dir_all(&category_dir).await {
            return FetchOutcome::Failed {
                error: CurateError::WriteFailed {
                    path: category_dir,
                    source,
                },
            };
        }

        let target = category_dir.join(record.file_name());
        if target.exists() {
            info!("Already exists: {}", record.file_name());
            return FetchOutcome::Skipped {
                path: target,
                reason: SkipReason::AlreadyPresent,
            };
        }

        let url = match self.resolve_url(record) {
            Ok(url) => url,
            Err(error) => {
                warn!("{}", error);
                return FetchOutcome::Failed { error };
            }
        };

        info!("Downloading {} from {}", record.file_name(), url);
        match self.fetch_to(&url, &target).await {
            Ok(Some(bytes)) => {
                info!("Downloaded {} ({} KB)", record.file_name(), bytes / 1024);
                FetchOutcome::Downloaded { path: target, bytes }
            }
            Ok(None) => {
                warn!(
                    "Access denied (403) for {}; may require institutional access. Manual download: {}{}",
                    record.file_name(),
                    url,
                    record.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
                );
                FetchOutcome::Skipped {
                    path: target,
                    reason: SkipReason::AccessDenied,
                }
            }
            Err(error) => {
                warn!("Failed {}: {}", record.file_name(), error);
                FetchOutcome::Failed { error }
            }
        }
    }

    /// Fetch every record in order, pausing between downloads.
    pub async fn download_all(&self, records: &[PaperRecord], base_dir: &Path) -> FetchSummary {
        let pause = Duration::from_millis(self.config.politeness_delay_ms);
        let mut summary = FetchSummary::default();
        for (i, record) in records.iter().enumerate() {
            let outcome = self.download(record, base_dir).await;
            let went_online = matches!(
                outcome,
                FetchOutcome::Downloaded { .. }
                    | FetchOutcome::Skipped {
                        reason: SkipReason::AccessDenied,
                        ..
                    }
                    | FetchOutcome::Failed { .. }
            );
            summary.push(record.clone(), outcome);
            if went_online && i + 1 < records.len() && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
        info!(
            "Fetched {} records: {} downloaded, {} skipped, {} failed",
            summary.total, summary.success, summary.skipped, summary.failed
        );
        summary
    }

    /// GET `url` and stream it to `target`. `Ok(None)` means HTTP 403.
    async fn fetch_to(&self, url: &str, target: &Path) -> Result<Option<u64>, CurateError> {
        let response = self.get_with_retry(url).await?;
        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CurateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !looks_like_pdf(url, &content_type) {
            warn!("{} might not be a PDF (content-type: {})", url, content_type);
        }

        stream_to_file(url, response, target).await.map(Some)
    }

    /// Send a GET, retrying transient statuses and network errors.
    ///
    /// Returns the first non-transient response, whatever its status.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, CurateError> {
        let max_retries = self.config.max_retries;
        let mut last_error = String::new();
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = retry_after.take().unwrap_or_else(|| self.config.backoff_for(attempt));
                warn!(
                    "{}: retry {}/{} after {}ms ({})",
                    url,
                    attempt,
                    max_retries,
                    delay.as_millis(),
                    last_error
                );
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !self.config.is_retryable_status(status) {
                        return Ok(response);
                    }
                    retry_after = parse_retry_after(&response);
                    last_error = format!("HTTP {}", status);
                }
                Err(e) if e.is_builder() => {
                    return Err(CurateError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(CurateError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_retries + 1,
            last_error,
        })
    }
}

fn looks_like_pdf(url: &str, content_type: &str) -> bool {
    content_type.to_lowercase().contains("pdf") || url.ends_with(".pdf")
}

/// Integer-seconds `Retry-After`; HTTP-date values are ignored.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn stream_to_file(url: &str, response: reqwest::Response, target: &Path) -> Result<u64, CurateError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source| CurateError::WriteFailed {
        path: target.to_path_buf(),
        source,
    };

    let part = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err)?;
    let mut file = tokio::fs::File::from_std(part.reopen().map_err(write_err)?);

    let mut bytes = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| CurateError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.write_all(&chunk).await.map_err(write_err)?;
        bytes += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;
    drop(file);

    part.persist(target).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes, target.display());
    Ok(bytes)
}
