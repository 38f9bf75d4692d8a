use url::Url;

/// Returns the host of a URL together with its explicit port, if any
///
/// Default ports are not part of the result because the `url` crate drops
/// them while parsing, so `http://example.com:80/` and `http://example.com/`
/// share the same key.
///
/// # Arguments
///
/// * `url` - The URL to read the authority from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, followed by `:port` when a non-default port is set
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_census::url::host_with_port;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_with_port(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_with_port(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true when both URLs point at the same host and port
pub fn same_host(a: &Url, b: &Url) -> bool {
    host_with_port(a) == host_with_port(b)
}
