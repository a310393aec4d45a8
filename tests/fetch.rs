//! Fetcher integration tests against an in-process HTTP stub.

use paper_curator::{
    CurateError, FetchConfig, FetchOutcome, FetchStatus, Fetcher, PaperRecord, PaperSource,
    SkipReason,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PDF_BODY: &[u8] = b"%PDF-1.4\n1 0 obj<<>>endobj\ntrailer<<>>\n%%EOF\n";

#[derive(Clone)]
struct Route {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

/// Minimal HTTP/1.1 server: one response per connection, hit counts per path.
///
/// A path may carry a sequence of responses; the n-th request gets the n-th
/// entry and the last entry repeats.
struct Stub {
    base: String,
    hits: Arc<HashMap<String, AtomicUsize>>,
}

impl Stub {
    async fn start(routes: Vec<(&str, Route)>) -> Self {
        Self::start_sequences(routes.into_iter().map(|(p, r)| (p, vec![r])).collect()).await
    }

    async fn start_sequences(routes: Vec<(&str, Vec<Route>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let hits: Arc<HashMap<String, AtomicUsize>> = Arc::new(
            routes
                .iter()
                .map(|(p, _)| (p.to_string(), AtomicUsize::new(0)))
                .collect(),
        );
        let table: Arc<HashMap<String, Vec<Route>>> =
            Arc::new(routes.into_iter().map(|(p, r)| (p.to_string(), r)).collect());

        let server_hits = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let table = Arc::clone(&table);
                let hits = Arc::clone(&server_hits);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&buf);
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let seen = hits
                        .get(&path)
                        .map_or(0, |counter| counter.fetch_add(1, Ordering::SeqCst));
                    let route = table
                        .get(&path)
                        .and_then(|seq| seq.get(seen).or_else(|| seq.last()))
                        .cloned()
                        .unwrap_or(Route {
                            status: 404,
                            content_type: "text/plain",
                            body: b"not found".to_vec(),
                        });

                    let header = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        route.status,
                        route.content_type,
                        route.body.len()
                    );
                    let _ = socket.write_all(header.as_bytes()).await;
                    let _ = socket.write_all(&route.body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base, hits }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn hits(&self, path: &str) -> usize {
        self.hits.get(path).map_or(0, |c| c.load(Ordering::SeqCst))
    }
}

fn pdf_route() -> Route {
    Route {
        status: 200,
        content_type: "application/pdf",
        body: PDF_BODY.to_vec(),
    }
}

fn status_route(status: u16) -> Route {
    Route {
        status,
        content_type: "text/html",
        body: b"<html>nope</html>".to_vec(),
    }
}

/// `RUST_LOG=paper_curator=debug cargo test --test fetch` shows retry logs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_fetcher(max_retries: u32) -> Fetcher {
    init_tracing();
    let config = FetchConfig::builder()
        .timeout_secs(5)
        .max_retries(max_retries)
        .backoff_base_ms(1)
        .politeness_delay_ms(0)
        .build()
        .unwrap();
    Fetcher::new(config).unwrap()
}

#[tokio::test]
async fn downloads_then_skips_without_second_request() {
    let stub = Stub::start(vec![("/pdf/1810.04805.pdf", pdf_route())]).await;
    let fetcher = fast_fetcher(0).with_arxiv_base(stub.url("/pdf"));
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::arxiv("03_language_models", "2018", "BERT", "1810.04805");

    let first = fetcher.download(&record, dir.path()).await;
    let expected = dir.path().join("03_language_models").join("2018_BERT.pdf");
    match &first {
        FetchOutcome::Downloaded { path, bytes } => {
            assert_eq!(path, &expected);
            assert_eq!(*bytes, PDF_BODY.len() as u64);
        }
        other => panic!("expected download, got {other:?}"),
    }
    assert_eq!(std::fs::read(&expected).unwrap(), PDF_BODY);

    let second = fetcher.download(&record, dir.path()).await;
    assert!(matches!(
        second,
        FetchOutcome::Skipped {
            reason: SkipReason::AlreadyPresent,
            ..
        }
    ));
    assert_eq!(stub.hits("/pdf/1810.04805.pdf"), 1);

    // No leftover partial files next to the target.
    let leftovers: Vec<_> = std::fs::read_dir(expected.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn forbidden_is_a_skip_and_writes_nothing() {
    let stub = Stub::start(vec![("/paywalled.pdf", status_route(403))]).await;
    let fetcher = fast_fetcher(3);
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::pdf("01_model_paradigm", "2004", "Brook_for_GPUs", &stub.url("/paywalled.pdf"))
        .with_note("ACM paywall - requires institutional access");

    let outcome = fetcher.download(&record, dir.path()).await;
    assert_eq!(outcome.status(), FetchStatus::Skip);
    assert!(matches!(
        outcome,
        FetchOutcome::Skipped {
            reason: SkipReason::AccessDenied,
            ..
        }
    ));
    assert!(!dir.path().join("01_model_paradigm").join("2004_Brook_for_GPUs.pdf").exists());
    // 403 is not retried.
    assert_eq!(stub.hits("/paywalled.pdf"), 1);
}

#[tokio::test]
async fn not_found_is_a_failure() {
    let stub = Stub::start(vec![("/missing.pdf", status_route(404))]).await;
    let fetcher = fast_fetcher(3);
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::pdf("02_infrastructure", "2016", "TensorFlow", &stub.url("/missing.pdf"));

    match fetcher.download(&record, dir.path()).await {
        FetchOutcome::Failed {
            error: CurateError::HttpStatus { status, .. },
        } => assert_eq!(status, 404),
        other => panic!("expected HTTP failure, got {other:?}"),
    }
    assert_eq!(stub.hits("/missing.pdf"), 1);
}

#[tokio::test]
async fn transient_status_is_retried_until_exhausted() {
    let stub = Stub::start(vec![("/busy.pdf", status_route(503))]).await;
    let fetcher = fast_fetcher(2);
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::pdf("02_infrastructure", "2017", "Horovod", &stub.url("/busy.pdf"));

    match fetcher.download(&record, dir.path()).await {
        FetchOutcome::Failed {
            error: CurateError::RetriesExhausted { attempts, last_error, .. },
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("503"), "got: {last_error}");
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(stub.hits("/busy.pdf"), 3);
}

#[tokio::test]
async fn transient_status_then_success_downloads() {
    let stub = Stub::start_sequences(vec![(
        "/flaky.pdf",
        vec![status_route(503), status_route(429), pdf_route()],
    )])
    .await;
    let fetcher = fast_fetcher(3);
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::pdf("02_infrastructure", "2018", "Ray", &stub.url("/flaky.pdf"));

    match fetcher.download(&record, dir.path()).await {
        FetchOutcome::Downloaded { path, bytes } => {
            assert_eq!(bytes, PDF_BODY.len() as u64);
            assert_eq!(std::fs::read(path).unwrap(), PDF_BODY);
        }
        other => panic!("expected download after retries, got {other:?}"),
    }
    assert_eq!(stub.hits("/flaky.pdf"), 3);
}

#[tokio::test]
async fn unexpected_content_type_still_downloads() {
    let stub = Stub::start(vec![(
        "/paper/download",
        Route {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: PDF_BODY.to_vec(),
        },
    )])
    .await;
    let fetcher = fast_fetcher(0);
    let dir = tempfile::tempdir().unwrap();
    let record = PaperRecord::pdf("04_multimodal", "2021", "DALL_E", &stub.url("/paper/download"));

    let outcome = fetcher.download(&record, dir.path()).await;
    assert_eq!(outcome.status(), FetchStatus::Success);
    let saved = dir.path().join("04_multimodal").join("2021_DALL_E.pdf");
    assert_eq!(std::fs::read(saved).unwrap(), PDF_BODY);
    assert_eq!(stub.hits("/paper/download"), 1);
}

#[tokio::test]
async fn unknown_source_fails_without_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = PaperRecord::arxiv("04_multimodal", "2021", "Mystery", "0000.00000");
    record.source = PaperSource::Unknown;

    let outcome = fast_fetcher(0).download(&record, dir.path()).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed {
            error: CurateError::UnknownSourceType { .. }
        }
    ));
}

#[tokio::test]
async fn batch_summary_counts_each_class() {
    let stub = Stub::start(vec![
        ("/ok.pdf", pdf_route()),
        ("/denied.pdf", status_route(403)),
        ("/gone.pdf", status_route(410)),
    ])
    .await;
    let fetcher = fast_fetcher(0);
    let dir = tempfile::tempdir().unwrap();
    let records = vec![
        PaperRecord::pdf("c", "2020", "Ok", &stub.url("/ok.pdf")),
        PaperRecord::pdf("c", "2020", "Denied", &stub.url("/denied.pdf")),
        PaperRecord::pdf("c", "2020", "Gone", &stub.url("/gone.pdf")),
    ];

    let summary = fetcher.download_all(&records, dir.path()).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(summary.outcomes[0].0.name, "Ok");

    let rerun = fetcher.download_all(&records, dir.path()).await;
    assert_eq!(rerun.skipped, 2);
    assert_eq!(rerun.failed, 1);
    assert_eq!(stub.hits("/ok.pdf"), 1);
}
