//! HTTP fetcher
//!
//! This module handles the HTTP side of a crawl cycle:
//! - Building the shared HTTP client
//! - Sending a GET request that gives up as soon as the run is canceled
//! - Checking the response status
//! - Exposing the response body as an async byte stream that stops when the
//!   run is canceled

use crate::config::CrawlerConfig;
use crate::CrawlError;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::io;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// The configured timeout covers the whole request, reading the body
/// included. Redirects are followed with reqwest's default policy.
///
/// # Arguments
///
/// * `config` - The crawl engine configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use link_census::config::CrawlerConfig;
/// use link_census::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request for `url` and checks the response status
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | `token` fires before the response headers arrive | `OperationCanceled` |
/// | Connection, TLS, redirect or timeout failure | `Request` |
/// | Status other than 200 or 204 | `UnexpectedStatusCode` |
pub async fn fetch(
    client: &Client,
    url: &Url,
    token: &CancellationToken,
) -> Result<Response, CrawlError> {
    tracing::debug!(url = %url, "sending http request");
    let started = Instant::now();

    let response = tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::debug!("http request canceled");
            return Err(CrawlError::OperationCanceled);
        }
        response = client.get(url.clone()).send() => response,
    };

    let response = response.map_err(|e| {
        tracing::error!(error = %e, "failed to send http request");
        CrawlError::Request(e)
    })?;

    tracing::debug!(
        status = response.status().as_u16(),
        elapsed = ?started.elapsed(),
        "received http response"
    );

    match response.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(response),
        status => {
            tracing::error!(status = status.as_u16(), "unexpected http status code");
            Err(CrawlError::UnexpectedStatusCode(status.as_u16()))
        }
    }
}

/// Returns the `Content-Type` header of a response, if it is valid text
pub fn declared_content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Turns a response into a reader over its (decompressed) body
///
/// The body is pulled from the connection as the reader is consumed. Once
/// `token` fires every further read fails with "operation canceled", so a
/// reader stuck on a stalled connection is released right away.
pub fn body_reader(
    response: Response,
    token: CancellationToken,
) -> impl AsyncRead + Send + Unpin + 'static {
    let chunks = Box::pin(response.bytes_stream());

    let body = futures::stream::unfold((chunks, token), |(mut chunks, token)| async move {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => {
                Some(Err(io::Error::other(CrawlError::OperationCanceled.to_string())))
            }
            chunk = chunks.next() => chunk.map(|chunk| chunk.map_err(io::Error::other)),
        };
        chunk.map(|chunk| (chunk, (chunks, token)))
    });

    StreamReader::new(Box::pin(body))
}
