//! URL handling module for Site-Scout
//!
//! This module provides scheme defaulting, link resolution, host extraction and
//! same-host scoping. Discovery results only ever contain URLs whose host is in
//! scope of the root host being audited.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_host, host_of};
pub use matcher::{host_in_scope, hosts_overlap, url_in_scope};
pub use normalize::{ensure_scheme, parse_root, resolve_link};

use crate::UrlError;
use url::Url;

/// A parsed site root together with its scoping host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRoot {
    /// The root URL, scheme defaulted to HTTPS
    pub url: Url,

    /// Lowercase host used for same-host scoping
    pub host: String,
}

impl SiteRoot {
    /// Parses caller input into a site root
    ///
    /// # Examples
    ///
    /// ```
    /// use site_scout::url::SiteRoot;
    ///
    /// let root = SiteRoot::parse("Example.com/shop").unwrap();
    /// assert_eq!(root.host, "example.com");
    /// assert_eq!(root.url.as_str(), "https://example.com/shop");
    /// ```
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let url = parse_root(input)?;
        let host = extract_host(&url).ok_or(UrlError::MissingDomain)?;
        Ok(Self { url, host })
    }

    /// The conventional sitemap location: `{scheme}://{host[:port]}/sitemap.xml`
    pub fn sitemap_url(&self) -> String {
        let mut candidate = self.url.clone();
        candidate.set_path("/sitemap.xml");
        candidate.set_query(None);
        candidate.set_fragment(None);
        candidate.to_string()
    }

    /// Checks whether an absolute URL string belongs to this site
    pub fn contains(&self, url: &str) -> bool {
        url_in_scope(url, &self.host)
    }
}
