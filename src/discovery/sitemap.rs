//! Sitemap resolution
//!
//! Expands `/sitemap.xml` (and any nested sitemap indexes) into a flat,
//! bounded, deduplicated list of in-scope page URLs.

use crate::config::Config;
use crate::crawler::build_client_with_timeout;
use crate::discovery::Lookup;
use crate::url::SiteRoot;
use crate::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of nested sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
    /// Well-formed XML with some other root element
    Unrecognized,
}

/// Parses a sitemap or sitemap index
///
/// Element names are matched by local name, so namespace prefixes are
/// ignored. `<loc>` text may be plain or CDATA.
///
/// # Examples
///
/// ```
/// use site_scout::discovery::{parse_sitemap, SitemapDocument};
///
/// let xml = r#"<urlset><url><loc>https://example.com/a</loc></url></urlset>"#;
/// assert_eq!(
///     parse_sitemap(xml).unwrap(),
///     SitemapDocument::UrlSet(vec!["https://example.com/a".to_string()])
/// );
/// ```
pub fn parse_sitemap(xml: &str) -> std::result::Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // Lowercase local names of the currently open elements
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut root: Option<Vec<u8>> = None;
    let mut in_loc = false;
    let mut entry_has_loc = false;
    let mut current = String::new();
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if root.is_none() {
                    root = Some(name.clone());
                }
                path.push(name);
                match path.len() {
                    2 => entry_has_loc = false,
                    3 if !entry_has_loc && is_entry_loc(&path) => {
                        in_loc = true;
                        current.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if root.is_none() {
                    root = Some(e.local_name().as_ref().to_ascii_lowercase());
                }
            }
            Event::End(_) => {
                if in_loc && path.len() == 3 {
                    in_loc = false;
                    entry_has_loc = true;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                path.pop();
            }
            Event::Text(t) if in_loc => current.push_str(&t.unescape()?),
            Event::CData(c) if in_loc => current.push_str(&String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(match root.as_deref() {
        Some(b"sitemapindex") => SitemapDocument::Index(locs),
        Some(b"urlset") => SitemapDocument::UrlSet(locs),
        _ => SitemapDocument::Unrecognized,
    })
}

/// True for `urlset/url/loc` and `sitemapindex/sitemap/loc`
///
/// Extension elements such as `image:image/image:loc` sit deeper and never
/// match.
fn is_entry_loc(path: &[Vec<u8>]) -> bool {
    match path {
        [root, entry, leaf] if leaf.as_slice() == b"loc" => matches!(
            (root.as_slice(), entry.as_slice()),
            (b"urlset", b"url") | (b"sitemapindex", b"sitemap")
        ),
        _ => false,
    }
}

/// Makes a `<loc>` value absolute against the sitemap it came from
///
/// Absolute locations are kept verbatim.
fn absolutize(base_url: &Url, loc: &str) -> Option<String> {
    let is_web = |url: &Url| matches!(url.scheme(), "http" | "https");
    match Url::parse(loc) {
        Ok(parsed) => is_web(&parsed).then(|| loc.to_string()),
        Err(_) => base_url
            .join(loc)
            .ok()
            .filter(is_web)
            .map(String::from),
    }
}

/// Resolves a site's sitemap into page URLs
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    client: Client,
}

impl SitemapResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a resolver whose requests use the sitemap timeout
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_client_with_timeout(
            &config.fetcher,
            Duration::from_secs(config.discovery.sitemap_timeout_secs),
        )?;
        Ok(Self::new(client))
    }

    /// Expands the sitemap of `root_url` into at most `max_urls` page URLs
    ///
    /// Sitemap documents are processed from a worklist in discovery order;
    /// each document is fetched at most once. Fetch failures, non-success
    /// statuses and empty bodies are skipped. Only URLs in scope of the root
    /// host are kept, in first-seen order.
    ///
    /// # Returns
    ///
    /// * `Lookup::Found(urls)` - At least one URL was found
    /// * `Lookup::Failed(reason)` - The root URL is invalid, or every fetched
    ///   document was malformed
    /// * `Lookup::Empty` - No sitemap, or sitemaps without usable URLs
    pub async fn resolve(&self, root_url: &str, max_urls: usize) -> Lookup<Vec<String>> {
        let root = match SiteRoot::parse(root_url) {
            Ok(root) => root,
            Err(e) => return Lookup::Failed(format!("invalid root URL '{}': {}", root_url, e)),
        };
        if max_urls == 0 {
            return Lookup::Empty;
        }

        let start = root.sitemap_url();
        let mut worklist = vec![start.clone()];
        let mut known: HashSet<String> = HashSet::from([start]);
        let mut cursor = 0;

        let mut urls: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut fetched = 0usize;
        let mut malformed = 0usize;

        'documents: while cursor < worklist.len() {
            let sitemap_url = worklist[cursor].clone();
            cursor += 1;

            let body = match self.fetch_document(&sitemap_url).await {
                Some(body) => body,
                None => continue,
            };
            fetched += 1;

            let base_url = match Url::parse(&sitemap_url) {
                Ok(base_url) => base_url,
                Err(_) => continue,
            };

            match parse_sitemap(&body) {
                Ok(SitemapDocument::Index(locs)) => {
                    tracing::debug!("Sitemap index {} lists {} sitemaps", sitemap_url, locs.len());
                    for loc in locs {
                        if let Some(nested) = absolutize(&base_url, &loc) {
                            if known.insert(nested.clone()) {
                                worklist.push(nested);
                            }
                        }
                    }
                }
                Ok(SitemapDocument::UrlSet(locs)) => {
                    for loc in locs {
                        let Some(page_url) = absolutize(&base_url, &loc) else {
                            continue;
                        };
                        if !root.contains(&page_url) || !seen.insert(page_url.clone()) {
                            continue;
                        }
                        urls.push(page_url);
                        if urls.len() >= max_urls {
                            tracing::debug!("Reached bound of {} URLs", max_urls);
                            break 'documents;
                        }
                    }
                }
                Ok(SitemapDocument::Unrecognized) => {
                    tracing::warn!("{} is not a sitemap document", sitemap_url);
                    malformed += 1;
                }
                Err(e) => {
                    tracing::warn!("Malformed sitemap {}: {}", sitemap_url, e);
                    malformed += 1;
                }
            }
        }

        if !urls.is_empty() {
            tracing::info!(
                "Sitemap for {} yielded {} URLs from {} documents",
                root.host,
                urls.len(),
                fetched
            );
            Lookup::Found(urls)
        } else if fetched > 0 && malformed == fetched {
            Lookup::Failed(format!(
                "{} sitemap document(s) for {} could not be parsed",
                malformed, root.host
            ))
        } else {
            tracing::debug!("No sitemap URLs for {}", root.host);
            Lookup::Empty
        }
    }

    /// Like [`resolve`](Self::resolve), flattening both non-found outcomes
    /// to an empty list
    pub async fn resolve_urls(&self, root_url: &str, max_urls: usize) -> Vec<String> {
        self.resolve(root_url, max_urls).await.unwrap_or_default()
    }

    async fn fetch_document(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Sitemap fetch failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Sitemap {} returned HTTP {}", url, response.status().as_u16());
            return None;
        }

        match response.text().await {
            Ok(body) if !body.trim().is_empty() => Some(body),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Could not read sitemap body for {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaced_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
              <url><loc> https://example.com/about </loc></url>
            </urlset>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec![
                "https://example.com/".to_string(),
                "https://example.com/about".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_prefixed_index() {
        let xml = r#"<sm:sitemapindex xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sm:sitemap><sm:loc>https://example.com/posts.xml</sm:loc></sm:sitemap>
              <sm:sitemap><sm:loc>/pages.xml</sm:loc></sm:sitemap>
            </sm:sitemapindex>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::Index(vec![
                "https://example.com/posts.xml".to_string(),
                "/pages.xml".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_cdata_and_entities() {
        let xml = r#"<urlset>
              <url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url>
              <url><loc>https://example.com/b?x=1&amp;y=2</loc></url>
            </urlset>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec![
                "https://example.com/a?x=1&y=2".to_string(),
                "https://example.com/b?x=1&y=2".to_string()
            ])
        );
    }

    #[test]
    fn test_image_extension_locs_ignored() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                     xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
              <url>
                <loc>https://example.com/page</loc>
                <image:image><image:loc>https://example.com/wp-content/photo.jpg</image:loc></image:image>
              </url>
              <url>
                <image:image><image:loc>https://example.com/wp-content/banner.png</image:loc></image:image>
                <loc>https://example.com/gallery</loc>
              </url>
            </urlset>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec![
                "https://example.com/page".to_string(),
                "https://example.com/gallery".to_string()
            ])
        );
    }

    #[test]
    fn test_one_loc_per_entry() {
        let xml = "<urlset><url><loc>https://example.com/a</loc><loc>https://example.com/b</loc></url></urlset>";
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec!["https://example.com/a".to_string()])
        );
    }

    #[test]
    fn test_parse_unrecognized_root() {
        let xml = "<html><body><p>Not found</p></body></html>";
        assert_eq!(parse_sitemap(xml).unwrap(), SitemapDocument::Unrecognized);
    }

    #[test]
    fn test_parse_mismatched_tags_is_error() {
        let xml = "<urlset><url><loc>https://example.com/</url></loc></urlset>";
        assert!(parse_sitemap(xml).is_err());
    }

    #[test]
    fn test_absolutize() {
        let base = Url::parse("https://example.com/sitemaps/index.xml").unwrap();
        assert_eq!(
            absolutize(&base, "pages.xml").as_deref(),
            Some("https://example.com/sitemaps/pages.xml")
        );
        assert_eq!(
            absolutize(&base, "https://example.com/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(absolutize(&base, "ftp://example.com/a"), None);
    }

    #[tokio::test]
    async fn test_invalid_root_fails() {
        let resolver = SitemapResolver::new(Client::new());
        let outcome = resolver.resolve("http://", 10).await;
        assert!(matches!(outcome, Lookup::Failed(_)));
        assert!(resolver.resolve_urls("http://", 10).await.is_empty());
    }
}
