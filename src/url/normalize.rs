use crate::UrlError;
use url::Url;

/// Schemes that never lead to a fetchable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Prefixes `https://` to input that carries no HTTP(S) scheme
///
/// # Examples
///
/// ```
/// use site_scout::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("example.com"), "https://example.com");
/// assert_eq!(ensure_scheme(" http://example.com/a "), "http://example.com/a");
/// ```
pub fn ensure_scheme(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Parses a caller-supplied root URL, defaulting the scheme to HTTPS
///
/// # Returns
///
/// * `Ok(Url)` - An absolute http(s) URL with a host
/// * `Err(UrlError)` - The input cannot be used as a site root
pub fn parse_root(input: &str) -> Result<Url, UrlError> {
    let with_scheme = ensure_scheme(input);
    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: and data: links
/// - fragment-only links (same page anchors)
/// - hrefs that do not resolve to an HTTP(S) URL
///
/// The fragment of the resolved URL is removed.
pub fn resolve_link(base_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);

    Some(absolute.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_ensure_scheme_keeps_existing() {
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
        assert_eq!(ensure_scheme("HTTP://Example.com"), "HTTP://Example.com");
    }

    #[test]
    fn test_ensure_scheme_defaults_to_https() {
        assert_eq!(ensure_scheme("example.com/page"), "https://example.com/page");
    }

    #[test]
    fn test_parse_root() {
        let url = parse_root("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_root_rejects_garbage() {
        assert!(parse_root("").is_err());
        assert!(parse_root("https://").is_err());
    }

    #[test]
    fn test_resolve_relative_links() {
        assert_eq!(
            resolve_link(&base(), "/about"),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(
            resolve_link(&base(), "other"),
            Some("https://example.com/blog/other".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_fragment() {
        assert_eq!(
            resolve_link(&base(), "/pricing#plans"),
            Some("https://example.com/pricing".to_string())
        );
    }

    #[test]
    fn test_resolve_skips_special_schemes() {
        assert_eq!(resolve_link(&base(), "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base(), "mailto:hi@example.com"), None);
        assert_eq!(resolve_link(&base(), "tel:+49301234"), None);
        assert_eq!(resolve_link(&base(), "data:text/html,hi"), None);
        assert_eq!(resolve_link(&base(), "#top"), None);
        assert_eq!(resolve_link(&base(), "ftp://example.com/file"), None);
        assert_eq!(resolve_link(&base(), "   "), None);
    }
}
