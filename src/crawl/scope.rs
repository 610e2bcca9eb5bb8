//! Crawl scope: which URLs belong to the mirrored collection

use url::Url;

/// Host and path restrictions applied to every discovered URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    host: Option<String>,
    /// Explicit port of the start URL; the scheme is not part of the scope
    port: Option<u16>,
    /// `/<root_segment>/`
    root_marker: String,
    /// Division path prefix, when the scope is confined to one division
    prefix: Option<String>,
}

impl Scope {
    /// Whole-site scope: same host as `start`, path containing `/<root_segment>/`
    pub fn site(start: &Url, root_segment: &str) -> Self {
        Self {
            host: start.host_str().map(|h| h.to_ascii_lowercase()),
            port: start.port(),
            root_marker: format!("/{}/", root_segment.trim_matches('/')),
            prefix: None,
        }
    }

    /// Narrow this scope to paths starting with `prefix`
    pub fn restricted_to(&self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..self.clone()
        }
    }

    /// The `/<root>/` marker in-scope paths must contain
    pub fn root_marker(&self) -> &str {
        &self.root_marker
    }

    /// Division prefix, if any
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Check whether a URL belongs to this scope
    pub fn in_scope(&self, url: &Url) -> bool {
        let Some(host) = self.host.as_deref() else {
            return false;
        };
        if url.host_str().map(|h| h.to_ascii_lowercase()).as_deref() != Some(host) {
            return false;
        }
        if url.port() != self.port {
            return false;
        }

        let path = url.path();
        if !path.contains(&self.root_marker) {
            return false;
        }

        match &self.prefix {
            Some(prefix) => path.starts_with(prefix.as_str()),
            None => true,
        }
    }

    /// String form of [`Scope::in_scope`]; unparsable URLs are out of scope
    pub fn in_scope_str(&self, url: &str) -> bool {
        Url::parse(url).map(|u| self.in_scope(&u)).unwrap_or(false)
    }

    /// Split a URL path at the first root marker
    ///
    /// Returns the path up to and including the marker, and everything after
    /// it: `/escudoteca/argentina/png/a.png` gives
    /// `("/escudoteca/", "argentina/png/a.png")`.
    pub fn split_root<'a>(&self, url: &'a Url) -> Option<(&'a str, &'a str)> {
        let path = url.path();
        let idx = path.find(&self.root_marker)?;
        let end = idx + self.root_marker.len();
        Some((&path[..end], &path[end..]))
    }

    /// Path segments after the root marker
    pub fn segments_below_root<'a>(&self, url: &'a Url) -> Option<Vec<&'a str>> {
        self.split_root(url).map(|(_, rest)| rest.split('/').collect())
    }
}
