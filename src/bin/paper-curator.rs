//! CLI binary for paper-curator.
//!
//! A thin shim over the library crate: flags map onto `FetchConfig` and
//! `ProcessorConfig`, results are printed to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use paper_curator::{
    catalog, DocumentProcessor, FetchConfig, FetchOutcome, Fetcher, OcrConfig, PaperRecord,
    PaperSource, ProcessingResult, ProcessorConfig, SkipReason,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// Download research papers and convert them into scored Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "paper-curator",
    version,
    about = "Download research papers and convert them into scored, chunked Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug logging.
    #[arg(short, long, global = true, env = "PAPER_CURATOR_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true, env = "PAPER_CURATOR_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the catalog into category folders.
    Download(DownloadArgs),
    /// Convert PDFs to Markdown and score them.
    Process(ProcessArgs),
    /// Print the catalog.
    Catalog {
        /// Catalog JSON file instead of the built-in list.
        #[arg(long, env = "PAPER_CURATOR_CATALOG")]
        catalog: Option<PathBuf>,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Base directory for downloads.
    #[arg(long, env = "PAPER_CURATOR_DIR", default_value = "papers")]
    dir: PathBuf,

    /// Catalog JSON file instead of the built-in list.
    #[arg(long, env = "PAPER_CURATOR_CATALOG")]
    catalog: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, env = "PAPER_CURATOR_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Retries on 429/5xx and network errors.
    #[arg(long, env = "PAPER_CURATOR_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Pause between downloads in milliseconds.
    #[arg(long, env = "PAPER_CURATOR_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// PDF files or directories (searched recursively for *.pdf).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write Markdown and images here.
    #[arg(short, long, env = "PAPER_CURATOR_OUT")]
    out: Option<PathBuf>,

    /// Also chunk each document (written to `{out}/chunks/{stem}.json` with --out).
    #[arg(long)]
    chunks: bool,

    /// Write one flattened row per document as JSON.
    #[arg(long, env = "PAPER_CURATOR_REPORT")]
    report: Option<PathBuf>,

    #[arg(long, env = "PAPER_CURATOR_CHUNK_SIZE", default_value_t = 1000)]
    chunk_size: usize,

    #[arg(long, env = "PAPER_CURATOR_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Score at or above which a document counts as good.
    #[arg(long, env = "PAPER_CURATOR_QUALITY_THRESHOLD", default_value_t = 0.7)]
    quality_threshold: f64,

    /// Do not transcribe scanned pages.
    #[arg(long, env = "PAPER_CURATOR_NO_OCR")]
    no_ocr: bool,

    /// Do not request or repair Markdown tables.
    #[arg(long, env = "PAPER_CURATOR_NO_TABLES")]
    no_tables: bool,

    /// Drop decorative pictures (icons, rules).
    #[arg(long, env = "PAPER_CURATOR_CLASSIFY_PICTURES")]
    classify_pictures: bool,

    /// LLM provider for OCR: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Vision model for OCR (default gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Download(args) => run_download(args, cli.quiet).await,
        Command::Process(args) => run_process(args, cli.quiet).await,
        Command::Catalog { catalog, json } => run_catalog(catalog.as_deref(), json),
    }
}

fn load_records(path: Option<&Path>) -> Result<Vec<PaperRecord>> {
    match path {
        Some(p) => catalog::load_catalog(p).context("Failed to load catalog"),
        None => Ok(catalog::builtin()),
    }
}

// ── download ─────────────────────────────────────────────────────────────

async fn run_download(args: DownloadArgs, quiet: bool) -> Result<()> {
    let records = load_records(args.catalog.as_deref())?;
    let config = FetchConfig::builder()
        .timeout_secs(args.timeout)
        .max_retries(args.max_retries)
        .politeness_delay_ms(args.delay_ms)
        .build()
        .context("Invalid configuration")?;
    let fetcher = Fetcher::new(config).context("Failed to build HTTP client")?;

    tokio::fs::create_dir_all(&args.dir)
        .await
        .with_context(|| format!("Failed to create {:?}", args.dir))?;

    if !quiet {
        eprintln!("{}", bold(&format!("Downloading {} papers to {}", records.len(), args.dir.display())));
    }
    let summary = fetcher.download_all(&records, &args.dir).await;

    if !quiet {
        for (record, outcome) in &summary.outcomes {
            let line = match outcome {
                FetchOutcome::Downloaded { bytes, .. } => {
                    format!("{} {} ({} KB)", green("[OK]  "), record.file_name(), bytes / 1024)
                }
                FetchOutcome::Skipped {
                    reason: SkipReason::AlreadyPresent,
                    ..
                } => format!("{} {} (already present)", green("[OK]  "), record.file_name()),
                FetchOutcome::Skipped {
                    reason: SkipReason::AccessDenied,
                    ..
                } => format!("{} {} (access denied)", yellow("[SKIP]"), record.file_name()),
                FetchOutcome::Failed { error } => {
                    format!("{} {}: {}", red("[FAIL]"), record.file_name(), error)
                }
            };
            eprintln!("{line}");
        }

        eprintln!();
        eprintln!("{}", bold("Summary"));
        eprintln!("  total    {}", summary.total);
        eprintln!("  success  {}", green(&summary.success.to_string()));
        eprintln!("  skipped  {}", yellow(&summary.skipped.to_string()));
        eprintln!("  failed   {}", red(&summary.failed.to_string()));

        print_tree(&args.dir).context("Failed to list download directory")?;
    }
    Ok(())
}

/// Per-category listing of downloaded PDFs.
fn print_tree(base: &Path) -> Result<()> {
    eprintln!();
    eprintln!("{}", bold(&format!("{}/", base.display())));
    let mut categories: Vec<PathBuf> = std::fs::read_dir(base)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    categories.sort();

    for dir in categories {
        let mut files: Vec<(String, u64)> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "pdf"))
            .map(|e| {
                let size = e.metadata().map(|m| m.len()).unwrap_or(0);
                (e.file_name().to_string_lossy().into_owned(), size)
            })
            .collect();
        files.sort();
        let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        eprintln!("  {}/ ({} files)", name, files.len());
        for (file, size) in files {
            eprintln!("    {} ({} KB)", file, size / 1024);
        }
    }
    Ok(())
}

// ── process ──────────────────────────────────────────────────────────────

async fn run_process(args: ProcessArgs, quiet: bool) -> Result<()> {
    let mut pdfs = Vec::new();
    for input in &args.inputs {
        collect_pdfs(input, &mut pdfs).with_context(|| format!("Failed to read {:?}", input))?;
    }
    if pdfs.is_empty() {
        anyhow::bail!("No PDF files found in {:?}", args.inputs);
    }

    let ocr = OcrConfig {
        provider_name: args.provider.clone(),
        model: args.model.clone(),
        ..OcrConfig::default()
    };
    let mut builder = ProcessorConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .quality_threshold(args.quality_threshold)
        .do_ocr(!args.no_ocr)
        .do_table_structure(!args.no_tables)
        .do_picture_classification(args.classify_pictures)
        .ocr(ocr);
    if let Some(ref out) = args.out {
        builder = builder.output_dir(out);
    }
    let config = builder.build().context("Invalid configuration")?;
    let mut processor = DocumentProcessor::new(config).context("Failed to create processor")?;

    let results = processor.batch_process(&pdfs).await;

    for (path, result) in pdfs.iter().zip(&results) {
        if !quiet {
            print_result(&processor, path, result);
        }
        if args.chunks {
            write_chunks(&processor, args.out.as_deref(), path, result, quiet).await?;
        }
    }

    if let Some(ref report) = args.report {
        let rows = results
            .iter()
            .map(ProcessingResult::to_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build report rows")?;
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialise report")?;
        tokio::fs::write(report, json)
            .await
            .with_context(|| format!("Failed to write report to {:?}", report))?;
    }

    if !quiet {
        let snap = processor.stats().snapshot();
        eprintln!();
        eprintln!("{}", bold("Processing stats"));
        eprintln!("  processed     {}", snap.stats.total_processed);
        eprintln!("  successful    {}", green(&snap.stats.successful.to_string()));
        eprintln!("  failed        {}", red(&snap.stats.failed.to_string()));
        eprintln!("  total time    {:.2}s", snap.stats.total_time);
        if let (Some(rate), Some(avg)) = (snap.success_rate, snap.avg_time_secs) {
            eprintln!("  success rate  {rate}%");
            eprintln!("  avg time      {avg}s");
        }
    }
    Ok(())
}

fn print_result(processor: &DocumentProcessor, path: &Path, result: &ProcessingResult) {
    match (&result.metadata, &result.error) {
        (Some(meta), _) => {
            let score = format!("{:.2}", meta.quality_score);
            let score = if processor.meets_quality_threshold(meta) {
                green(&score)
            } else {
                yellow(&score)
            };
            eprintln!(
                "{} {}  {}  {} words  quality {}  {:.2}s",
                green("[OK]  "),
                meta.filename,
                meta.document_type,
                meta.word_count,
                score,
                result.processing_time
            );
        }
        (None, error) => eprintln!(
            "{} {}: {}",
            red("[FAIL]"),
            path.display(),
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}

async fn write_chunks(
    processor: &DocumentProcessor,
    out: Option<&Path>,
    path: &Path,
    result: &ProcessingResult,
    quiet: bool,
) -> Result<()> {
    let Some(ref content) = result.content else {
        return Ok(());
    };
    let chunks = processor.chunk_content(content, result.metadata.as_ref());
    match out {
        Some(out) => {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let dir = out.join("chunks");
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {:?}", dir))?;
            let file = dir.join(format!("{stem}.json"));
            let json = serde_json::to_string_pretty(&chunks).context("Failed to serialise chunks")?;
            tokio::fs::write(&file, json)
                .await
                .with_context(|| format!("Failed to write {:?}", file))?;
            if !quiet {
                eprintln!("       {} chunks → {}", chunks.len(), file.display());
            }
        }
        None if !quiet => eprintln!("       {} chunks", chunks.len()),
        None => {}
    }
    Ok(())
}

fn collect_pdfs(path: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    if path.is_dir() {
        let mut entries: Vec<PathBuf> =
            std::fs::read_dir(path)?.filter_map(|e| e.ok().map(|e| e.path())).collect();
        entries.sort();
        for entry in entries {
            if entry.is_dir() || entry.extension().is_some_and(|x| x.eq_ignore_ascii_case("pdf")) {
                collect_pdfs(&entry, out)?;
            }
        }
    } else {
        out.push(path.to_path_buf());
    }
    Ok(())
}

// ── catalog ──────────────────────────────────────────────────────────────

fn run_catalog(path: Option<&Path>, json: bool) -> Result<()> {
    let records = load_records(path)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).context("Failed to serialise catalog")?
        );
        return Ok(());
    }
    let mut current = "";
    for record in &records {
        if record.category != current {
            current = &record.category;
            println!("{}", bold(current));
        }
        let source = match &record.source {
            PaperSource::Arxiv { arxiv_id } => format!("arXiv:{arxiv_id}"),
            PaperSource::Pdf { url } => url.clone(),
            PaperSource::Unknown => "unknown source".to_string(),
        };
        println!("  {:<40} {}", record.file_name(), source);
    }
    println!("\n{} papers", records.len());
    Ok(())
}
