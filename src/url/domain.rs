use url::Url;

/// Extracts the lowercase host from a URL
///
/// The port is not part of the result.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_scout::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Parses a URL string and extracts its host
///
/// Returns None for relative or malformed input.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim()).ok().as_ref().and_then(extract_host)
}
