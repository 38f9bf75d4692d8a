//! Integration tests for the crawl engine

use crate::common::{collect, crawler_config};
use link_census::config::DEFAULT_USER_AGENT;
use link_census::crawler::LinkCrawler;
use link_census::extract::ExtractorRegistry;
use link_census::{CrawlError, CrawlResult};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawler(num_workers: usize) -> LinkCrawler {
    LinkCrawler::new(
        &crawler_config(num_workers),
        ExtractorRegistry::with_defaults(),
    )
    .expect("Failed to build crawler")
}

async fn crawl_one(source: String) -> CrawlResult {
    crawler(1).crawl(&CancellationToken::new(), source).await
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_html_links_are_sorted() {
    let server = MockServer::start().await;
    let base = server.uri();

    let html = format!(
        r##"<!DOCTYPE html>
<html><head><title>Links</title></head>
<body>
    <a href=".">Dot</a>
    <a href="/absolute/path">Absolute</a>
    <a href="relative/path">Relative</a>
    <a href="#anchor">Anchor</a>
    <a href="?message=hello%20world">Query</a>
    <a href="">Empty</a>
    <a href="https://example.org/x">Other host</a>
    <a href="//cdn.example.org/lib.js">Protocol relative</a>
    <a href="javascript:alert('hello')">Script</a>
    <a href="mailto:john@example.com">Mail</a>
    <a href="{base}/explicit">Explicit</a>
</body></html>"##
    );
    mount(
        &server,
        "/path",
        ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"),
    )
    .await;

    let result = crawl_one(format!("{}/path", base)).await;

    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert_eq!(
        result.internal_links,
        vec![
            format!("{}/", base),
            format!("{}/absolute/path", base),
            format!("{}/relative/path", base),
            format!("{}/path#anchor", base),
            format!("{}/path?message=hello%20world", base),
            format!("{}/path", base),
            format!("{}/explicit", base),
        ]
    );
    assert_eq!(
        result.external_links,
        vec!["https://example.org/x", "//cdn.example.org/lib.js"]
    );
}

#[tokio::test]
async fn test_json_body() {
    let server = MockServer::start().await;
    let base = server.uri();

    let json = format!(
        r#"{{
            "self": "{base}/api/items",
            "items": [
                {{"href": "https://docs.example.org/guide"}},
                {{"href": "{base}/api/items/2", "id": 2}}
            ],
            "https://bing.com/?q=link+in+key": null
        }}"#
    );
    mount(
        &server,
        "/api/items",
        ResponseTemplate::new(200).set_body_raw(json, "application/json"),
    )
    .await;

    let result = crawl_one(format!("{}/api/items", base)).await;

    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert_eq!(
        result.internal_links,
        vec![
            format!("{}/api/items", base),
            format!("{}/api/items/2", base),
        ]
    );
    assert_eq!(
        result.external_links,
        vec!["https://docs.example.org/guide", "https://bing.com/?q=link+in+key"]
    );
}

#[tokio::test]
async fn test_legacy_json_media_type() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/legacy",
        ResponseTemplate::new(200)
            .set_body_raw(r#"["https://a.example.org", "https://b.example.org"]"#, "text/x-json"),
    )
    .await;

    let result = crawl_one(format!("{}/legacy", server.uri())).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert_eq!(result.external_links.len(), 2);
}

#[tokio::test]
async fn test_plain_text_body() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/notes.txt",
        ResponseTemplate::new(200).set_body_raw(
            "reading list:\nhttps://a.example.org/1\nhttps://b.example.org/2 and https://a.example.org/1\n",
            "text/plain",
        ),
    )
    .await;

    let result = crawl_one(format!("{}/notes.txt", server.uri())).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert!(result.internal_links.is_empty());
    assert_eq!(
        result.external_links,
        vec![
            "https://a.example.org/1",
            "https://b.example.org/2",
            "https://a.example.org/1",
        ]
    );
}

#[tokio::test]
async fn test_untyped_html_is_sniffed() {
    let server = MockServer::start().await;

    // Long enough that the anchors sit well past the sniffed prefix
    let mut html = String::from("<html><head><title>Untyped</title></head><body>\n");
    html.push_str(&"<p>filler paragraph</p>\n".repeat(40));
    html.push_str(r#"<a href="/after-prefix">late</a><a href="https://example.org/">out</a>"#);
    html.push_str("</body></html>");
    assert!(html.len() > 512);

    mount(
        &server,
        "/untyped",
        ResponseTemplate::new(200).set_body_bytes(html.into_bytes()),
    )
    .await;

    let result = crawl_one(format!("{}/untyped", server.uri())).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert_eq!(
        result.internal_links,
        vec![format!("{}/after-prefix", server.uri())]
    );
    assert_eq!(result.external_links, vec!["https://example.org/"]);
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/logo.png",
        ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
    )
    .await;

    let result = crawl_one(format!("{}/logo.png", server.uri())).await;
    let error = result.error.expect("expected an error");
    assert!(matches!(error, CrawlError::UnsupportedContentType(ref t) if t == "image/png"));
    assert_eq!(error.to_string(), "unsupported content type: image/png");
    assert!(result.internal_links.is_empty());
}

#[tokio::test]
async fn test_unexpected_status_code() {
    let server = MockServer::start().await;
    mount(&server, "/missing", ResponseTemplate::new(404)).await;

    let result = crawl_one(format!("{}/missing", server.uri())).await;
    let error = result.error.expect("expected an error");
    assert_eq!(error.to_string(), "unexpected status code: 404");
}

#[tokio::test]
async fn test_no_content_is_success() {
    let server = MockServer::start().await;
    mount(&server, "/empty", ResponseTemplate::new(204)).await;

    let result = crawl_one(format!("{}/empty", server.uri())).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert!(result.internal_links.is_empty());
    assert!(result.external_links.is_empty());
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent"))
        .and(header("user-agent", "census-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<a href=\"/x\">x</a>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = crawler_config(1);
    config.user_agent = "census-test/1.0".to_string();
    let crawler = LinkCrawler::new(&config, ExtractorRegistry::with_defaults()).unwrap();

    let result = crawler
        .crawl(&CancellationToken::new(), format!("{}/agent", server.uri()))
        .await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
}

#[tokio::test]
async fn test_default_user_agent_is_sent_verbatim() {
    // The default agent contains commas, so the raw request head is checked
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (head_tx, head_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 204 No Content\r\n\r\n")
            .await
            .unwrap();
        let _ = head_tx.send(String::from_utf8_lossy(&head).to_lowercase());
    });

    let result = crawl_one(format!("http://{}/agent", addr)).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);

    let head = head_rx.await.unwrap();
    let expected = format!("user-agent: {}\r\n", DEFAULT_USER_AGENT.to_lowercase());
    assert!(head.contains(&expected), "request head: {}", head);
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/slow",
        ResponseTemplate::new(200)
            .set_body_raw("<html></html>", "text/html")
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let mut config = crawler_config(1);
    config.timeout = Duration::from_millis(200);
    let crawler = LinkCrawler::new(&config, ExtractorRegistry::with_defaults()).unwrap();

    let result = crawler
        .crawl(&CancellationToken::new(), format!("{}/slow", server.uri()))
        .await;
    let error = result.error.expect("expected an error");
    assert!(matches!(error, CrawlError::Request(_)));
    assert!(error.to_string().starts_with("failed to send http request: "));
}

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/slow",
        ResponseTemplate::new(200)
            .set_body_raw("<html></html>", "text/html")
            .set_delay(Duration::from_secs(10)),
    )
    .await;

    let token = CancellationToken::new();
    let canceler = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceler.cancel();
    });

    let started = Instant::now();
    let result = crawler(1).crawl(&token, format!("{}/slow", server.uri())).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(result.error, Some(CrawlError::OperationCanceled)));
}

/// Serves response headers and the start of a body, then never sends more
async fn stalled_body_server(content_type: Option<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;

                let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Length: 100000\r\n");
                if let Some(content_type) = content_type {
                    head.push_str(&format!("Content-Type: {}\r\n", content_type));
                }
                head.push_str("\r\n<html><body><a href=\"/first\">first</a>");

                let _ = socket.write_all(head.as_bytes()).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    format!("http://{}/stalled", addr)
}

#[tokio::test]
async fn test_cancel_while_body_stalls() {
    // Declared type stalls in extraction, a missing one stalls in sniffing
    for content_type in [Some("text/html"), None] {
        let source = stalled_body_server(content_type).await;

        let token = CancellationToken::new();
        let canceler = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            canceler.cancel();
        });

        let started = Instant::now();
        let result = crawler(1).crawl(&token, source).await;

        assert!(
            started.elapsed() < Duration::from_secs(5),
            "content type {:?}: took {:?}",
            content_type,
            started.elapsed()
        );
        assert!(
            matches!(result.error, Some(CrawlError::OperationCanceled)),
            "content type {:?}: {:?}",
            content_type,
            result.error
        );
    }
}

#[tokio::test]
async fn test_every_source_is_crawled_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/next">next</a><a href="https://example.org">out</a>"#, "text/html"),
        )
        .mount(&server)
        .await;

    for num_workers in [1, 5, 24] {
        let crawler = crawler(num_workers);
        let (tx, rx) = mpsc::channel(2 * num_workers);
        let results = crawler.crawl_links(CancellationToken::new(), rx);

        let base = server.uri();
        tokio::spawn(async move {
            for i in 0..40 {
                tx.send(format!("{}/page/{}", base, i)).await.unwrap();
            }
        });

        let collected = collect(results).await;
        assert_eq!(collected.len(), 40, "workers: {}", num_workers);
        assert!(collected.iter().all(|r| r.is_success()));
        assert!(collected
            .iter()
            .all(|r| r.internal_links.len() == 1 && r.external_links.len() == 1));

        let mut sources: Vec<&str> = collected.iter().map(|r| r.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();
        assert_eq!(sources.len(), 40);
    }
}

#[tokio::test]
async fn test_mixed_sources_never_abort_the_pool() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/ok",
        ResponseTemplate::new(200).set_body_raw("<a href=\"/a\">a</a>", "text/html"),
    )
    .await;
    mount(&server, "/gone", ResponseTemplate::new(410)).await;

    let (tx, rx) = mpsc::channel(8);
    let results = crawler(3).crawl_links(CancellationToken::new(), rx);

    for source in [
        format!("{}/ok", server.uri()),
        "ftp://example.com".to_string(),
        format!("{}/gone", server.uri()),
        "https:///nohost".to_string(),
    ] {
        tx.send(source).await.unwrap();
    }
    drop(tx);

    let collected = collect(results).await;
    assert_eq!(collected.len(), 4);
    assert_eq!(collected.iter().filter(|r| r.is_success()).count(), 1);
}
