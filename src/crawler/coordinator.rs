//! Crawl engine
//!
//! A [`LinkCrawler`] runs a fixed pool of workers that share one queue of
//! sources and one queue of results. Each worker takes a source, runs one
//! crawl cycle for it and reports a [`CrawlResult`]:
//!
//! 1. Normalize the source into a URL
//! 2. GET it, giving up when the run is canceled
//! 3. Resolve the media type, sniffing the body when the header is unhelpful
//! 4. Extract raw links with the extractor registered for that media type
//! 5. Sort the links into internal and external ones

use crate::config::{CrawlerConfig, DEFAULT_NUM_WORKERS, DEFAULT_TIMEOUT, MAX_NUM_WORKERS};
use crate::crawler::content_type::resolve_content_type;
use crate::crawler::fetcher::{body_reader, build_http_client, declared_content_type, fetch};
use crate::crawler::parser::{sort_links, SortedLinks};
use crate::extract::{ExtractorRegistry, LinkExtractor};
use crate::url::SourceUrl;
use crate::CrawlError;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of crawling one source
///
/// When `error` is set both link lists are empty.
#[derive(Debug)]
pub struct CrawlResult {
    /// The source exactly as it was received
    pub source: String,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub error: Option<CrawlError>,
}

impl CrawlResult {
    pub fn success(source: String, links: SortedLinks) -> Self {
        Self {
            source,
            internal_links: links.internal,
            external_links: links.external,
            error: None,
        }
    }

    pub fn failure(source: String, error: CrawlError) -> Self {
        Self {
            source,
            internal_links: Vec::new(),
            external_links: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

type SourceQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Concurrent crawl engine
///
/// The HTTP client and extractor registry are shared read-only between
/// workers, so cloning a `LinkCrawler` is cheap.
#[derive(Debug, Clone)]
pub struct LinkCrawler {
    client: Client,
    extractors: Arc<ExtractorRegistry>,
    num_workers: usize,
}

impl LinkCrawler {
    /// Creates a new crawl engine
    ///
    /// A worker count below 1 falls back to the default of 10 and one above
    /// 24 is capped at 24. A zero timeout falls back to 30 seconds.
    ///
    /// # Arguments
    ///
    /// * `config` - Worker count, request timeout and user agent
    /// * `extractors` - Extractors keyed by media type
    ///
    /// # Returns
    ///
    /// * `Ok(LinkCrawler)` - Ready to crawl
    /// * `Err(CrawlError::Client)` - The HTTP client could not be built
    pub fn new(config: &CrawlerConfig, extractors: ExtractorRegistry) -> Result<Self, CrawlError> {
        let config = CrawlerConfig {
            num_workers: clamp_num_workers(config.num_workers),
            timeout: if config.timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                config.timeout
            },
            user_agent: config.user_agent.clone(),
        };

        let client = build_http_client(&config).map_err(CrawlError::Client)?;

        tracing::debug!(
            num_workers = config.num_workers,
            timeout = ?config.timeout,
            media_types = ?extractors.media_types(),
            "initialized link crawler"
        );

        Ok(Self {
            client,
            extractors: Arc::new(extractors),
            num_workers: config.num_workers,
        })
    }

    /// Number of workers started by [`crawl_links`](Self::crawl_links)
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Starts the worker pool
    ///
    /// Workers pull from `sources` until it is closed and drained, or until
    /// `token` is canceled. The returned queue is closed once every worker
    /// has exited. Results arrive in completion order, not in source order.
    pub fn crawl_links(
        &self,
        token: CancellationToken,
        sources: mpsc::Receiver<String>,
    ) -> mpsc::Receiver<CrawlResult> {
        let (results_tx, results_rx) = mpsc::channel(1);
        let sources: SourceQueue = Arc::new(Mutex::new(sources));
        let mut workers = JoinSet::new();

        for worker_id in 0..self.num_workers {
            let crawler = self.clone();
            let worker = crawler.run_worker(token.clone(), Arc::clone(&sources), results_tx.clone());
            workers.spawn(worker.instrument(tracing::debug_span!("worker", worker_id)));
        }

        tokio::spawn(async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "crawl worker failed");
                }
            }
            // Only now may the result queue close.
            drop(results_tx);
            tracing::debug!("stopped all crawl workers");
        });

        results_rx
    }

    async fn run_worker(
        self,
        token: CancellationToken,
        sources: SourceQueue,
        results: mpsc::Sender<CrawlResult>,
    ) {
        tracing::debug!("started crawl worker");

        loop {
            let source = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("crawl worker canceled");
                    break;
                }
                source = next_source(&sources) => match source {
                    Some(source) => source,
                    None => break,
                },
            };

            let result = self.crawl(&token, source).await;
            if results.send(result).await.is_err() {
                tracing::debug!("result queue closed");
                break;
            }
        }

        tracing::debug!("stopped crawl worker");
    }

    /// Runs one crawl cycle for `source`
    ///
    /// Never fails: every error ends up in the returned result.
    pub async fn crawl(&self, token: &CancellationToken, source: String) -> CrawlResult {
        let span = tracing::debug_span!("crawl", source = %source);

        async move {
            tracing::debug!("started crawling");
            let started = Instant::now();

            let result = match self.crawl_source(token, &source).await {
                Ok(links) => CrawlResult::success(source, links),
                Err(e) => CrawlResult::failure(source, e),
            };

            tracing::debug!(
                elapsed = ?started.elapsed(),
                success = result.is_success(),
                "finished crawling"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn crawl_source(
        &self,
        token: &CancellationToken,
        source: &str,
    ) -> Result<SortedLinks, CrawlError> {
        let url = SourceUrl::parse(source).map_err(|e| {
            tracing::error!(error = %e, "failed to parse url");
            e
        })?;

        let response = fetch(&self.client, url.as_url(), token).await?;

        // A worker stuck on a stalled body must still stop with the run.
        let links = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("crawl canceled while reading body");
                return Err(CrawlError::OperationCanceled);
            }
            links = self.read_links(token, response) => links?,
        };

        Ok(sort_links(url.as_url(), links))
    }

    async fn read_links(
        &self,
        token: &CancellationToken,
        response: Response,
    ) -> Result<Vec<String>, CrawlError> {
        let declared = declared_content_type(&response);
        let body = body_reader(response, token.clone());

        let (media_type, body) = resolve_content_type(declared.as_deref(), body)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to detect content type");
                CrawlError::ContentDetection(e)
            })?;

        let Some(extractor) = self.extractors.get(&media_type) else {
            tracing::error!(content_type = %media_type, "unsupported content type");
            return Err(CrawlError::UnsupportedContentType(media_type));
        };

        let links = extract_links(extractor, body).await.map_err(|e| {
            tracing::error!(error = %e, "failed to get links");
            e
        })?;
        tracing::debug!(links = links.len(), content_type = %media_type, "collected links");

        Ok(links)
    }
}

async fn next_source(sources: &Mutex<mpsc::Receiver<String>>) -> Option<String> {
    sources.lock().await.recv().await
}

/// Runs a synchronous extractor over an async body on the blocking pool
async fn extract_links<R>(
    extractor: Arc<dyn LinkExtractor>,
    body: R,
) -> Result<Vec<String>, CrawlError>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut reader = SyncIoBridge::new(body);
    let links = tokio::task::spawn_blocking(move || extractor.extract(&mut reader)).await??;
    Ok(links)
}

fn clamp_num_workers(num_workers: usize) -> usize {
    match num_workers {
        0 => DEFAULT_NUM_WORKERS,
        n if n > MAX_NUM_WORKERS => MAX_NUM_WORKERS,
        n => n,
    }
}
