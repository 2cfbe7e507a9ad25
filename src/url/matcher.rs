use crate::url::domain::host_of;

/// Checks whether a host belongs to the site rooted at `root_host`
///
/// A host is in scope when it equals the root host or is a subdomain of it.
/// The comparison is label-aware, so `notexample.com` is not in scope of
/// `example.com`.
///
/// # Examples
///
/// ```
/// use site_scout::url::host_in_scope;
///
/// assert!(host_in_scope("example.com", "example.com"));
/// assert!(host_in_scope("blog.example.com", "example.com"));
/// assert!(!host_in_scope("notexample.com", "example.com"));
/// assert!(!host_in_scope("example.com", "blog.example.com"));
/// ```
pub fn host_in_scope(host: &str, root_host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let root = root_host.trim_end_matches('.').to_ascii_lowercase();

    if root.is_empty() || host.is_empty() {
        return false;
    }

    if host == root {
        return true;
    }

    host.strip_suffix(&root)
        .map_or(false, |prefix| prefix.ends_with('.'))
}

/// Checks whether either host is in scope of the other
///
/// Used to drop a site's own pages from search results:
/// `www.example.com` and `example.com` overlap in both directions.
pub fn hosts_overlap(a: &str, b: &str) -> bool {
    host_in_scope(a, b) || host_in_scope(b, a)
}

/// Checks whether an absolute URL string is in scope of `root_host`
pub fn url_in_scope(url: &str, root_host: &str) -> bool {
    host_of(url).map_or(false, |host| host_in_scope(&host, root_host))
}
